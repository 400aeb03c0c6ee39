// src/app/utils.rs
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;

use crate::app::types::{Movie, MovieDetails};

/// Year part of a `YYYY-MM-DD` release date.
pub fn release_year(date: Option<&str>) -> Option<i32> {
    let date = date?.trim();
    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(d.year());
    }
    // partial dates ("1999" / "1999-05") still carry a year
    date.get(..4).and_then(|y| y.parse::<i32>().ok())
}

pub fn format_rating(vote_average: f64) -> String {
    if vote_average > 0.0 {
        format!("{vote_average:.1}")
    } else {
        "N/A".into()
    }
}

/// Group digits in threes: 1234567 -> "1,234,567".
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_currency(value: u64) -> String {
    if value == 0 {
        "Not available".into()
    } else {
        format!("${}", format_thousands(value))
    }
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// One-line card: `Dune (2021)  ★ 7.8 • en`.
pub fn movie_card_line(movie: &Movie) -> String {
    let title = match release_year(movie.release_date.as_deref()) {
        Some(y) => format!("{} ({})", movie.title, y),
        None => movie.title.clone(),
    };
    let lang = movie.original_language.as_deref().unwrap_or("n/a");
    format!("{title}  ★ {} • {lang}", format_rating(movie.vote_average))
}

pub fn detail_lines(details: &MovieDetails) -> Vec<String> {
    let m = &details.movie;
    let mut lines = vec![movie_card_line(m)];
    if let Some(tagline) = &details.tagline {
        lines.push(format!("  \"{tagline}\""));
    }
    if let Some(votes) = details.vote_count {
        lines.push(format!("  Votes: {}", format_thousands(votes)));
    }
    if let Some(rt) = details.runtime {
        lines.push(format!("  Runtime: {}", format_runtime(rt)));
    }
    if let Some(date) = &m.release_date {
        lines.push(format!("  Release Date: {date}"));
    }
    lines.push(format!("  Budget: {}", format_currency(details.budget)));
    lines.push(format!("  Revenue: {}", format_currency(details.revenue)));
    if !details.genres.is_empty() {
        lines.push(format!(
            "  Genres: {}",
            details.genres.iter().map(|g| g.name.as_str()).join(", ")
        ));
    }
    if let Some(overview) = &details.overview {
        lines.push(format!("  Overview: {overview}"));
    }
    if !details.cast.is_empty() {
        lines.push(format!(
            "  Cast: {}",
            details
                .cast
                .iter()
                .map(|c| match &c.character {
                    Some(role) if !role.is_empty() => format!("{} as {role}", c.name),
                    _ => c.name.clone(),
                })
                .join(", ")
        ));
    }
    if let Some(key) = &details.trailer_key {
        lines.push(format!("  Trailer: https://www.youtube.com/watch?v={key}"));
    }
    if !details.similar.is_empty() {
        lines.push(format!(
            "  Similar: {}",
            details.similar.iter().map(|s| s.title.as_str()).join(" | ")
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years_from_dates() {
        assert_eq!(release_year(Some("2021-09-15")), Some(2021));
        assert_eq!(release_year(Some("1999")), Some(1999));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }

    #[test]
    fn money_and_counts() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(165_000_000), "165,000,000");
        assert_eq!(format_currency(0), "Not available");
        assert_eq!(format_currency(1_234_567), "$1,234,567");
    }

    #[test]
    fn runtime_and_rating() {
        assert_eq!(format_runtime(155), "2h 35m");
        assert_eq!(format_runtime(45), "0h 45m");
        assert_eq!(format_rating(7.849), "7.8");
        assert_eq!(format_rating(0.0), "N/A");
    }

    #[test]
    fn card_line_shape() {
        let m = Movie {
            id: 1,
            title: "Dune".into(),
            vote_average: 7.8,
            release_date: Some("2021-09-15".into()),
            original_language: Some("en".into()),
            ..Movie::default()
        };
        assert_eq!(movie_card_line(&m), "Dune (2021)  ★ 7.8 • en");
    }
}
