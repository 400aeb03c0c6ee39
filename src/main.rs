// src/main.rs
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cinedex::app::utils::{detail_lines, movie_card_line};
use cinedex::app::{
    parse_page, DetailState, DiscoveryApp, FetchState, PageNav, PopularityStore, SessionPrefs,
    SqliteTrendingStore, TmdbClient,
};
use cinedex::config::load_config;

const TICK: Duration = Duration::from_millis(50);

const HELP: &str = "\
type text to search (empty line shows popular movies)
  :first :prev :next :last   page navigation
  :page N                    jump to page N
  :detail ID                 show details for a movie id
  :close                     close the detail view
  :trending                  reload trending searches
  :clear                     clear the search box
  :quit";

enum Command {
    Search(String),
    Nav(PageNav),
    Detail(u64),
    CloseDetail,
    Trending,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let Some(cmd) = line.strip_prefix(':') else {
        return Some(Command::Search(line.to_string()));
    };
    let (name, arg) = cmd.split_once(' ').unwrap_or((cmd, ""));
    let cmd = match name.trim() {
        "first" => Command::Nav(PageNav::First),
        "prev" | "previous" => Command::Nav(PageNav::Previous),
        "next" => Command::Nav(PageNav::Next),
        "last" => Command::Nav(PageNav::Last),
        "page" => Command::Nav(PageNav::To(i64::from(parse_page(arg)))),
        "detail" => Command::Detail(arg.trim().parse().ok()?),
        "close" => Command::CloseDetail,
        "trending" => Command::Trending,
        "clear" => Command::Search(String::new()),
        "help" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

fn render(app: &DiscoveryApp, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    if !app.trending().is_empty() {
        writeln!(out, "Trending Movies")?;
        for (i, entry) in app.trending().iter().enumerate() {
            writeln!(out, "  {}. {} ({} searches)", i + 1, entry.title, entry.search_count)?;
        }
    }

    let heading = if app.stable_query().is_empty() {
        "All Movies".to_string()
    } else {
        format!("Results for \"{}\"", app.stable_query())
    };
    writeln!(out, "{heading}")?;
    match app.fetch_state() {
        FetchState::Idle => {}
        FetchState::Loading => writeln!(out, "  loading…")?,
        FetchState::Failed(msg) => writeln!(out, "  {msg}")?,
        FetchState::Success { movies, total_pages } => {
            for m in movies {
                writeln!(out, "  [{}] {}", m.id, movie_card_line(m))?;
            }
            if *total_pages > 0 {
                let busy = app.is_page_transitioning();
                let back = if app.pager().can_go_back(busy) { "< :prev" } else { "" };
                let fwd = if app.pager().can_go_forward(busy) { ":next >" } else { "" };
                writeln!(out, "  {back}  {}  {fwd}", app.pager().label())?;
            }
        }
    }

    match app.detail_state() {
        DetailState::Idle => {}
        DetailState::Loading(id) => writeln!(out, "Details: loading {id}…")?,
        DetailState::Failed(msg) => writeln!(out, "Details: {msg}")?,
        DetailState::Ready(details) => {
            writeln!(out, "Details")?;
            for line in detail_lines(details) {
                writeln!(out, "{line}")?;
            }
        }
    }
    out.flush()
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let cfg = load_config();

    let client = match TmdbClient::new(&cfg) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("catalog client failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    let store: Arc<dyn PopularityStore> = match SqliteTrendingStore::open(&cfg.trending_db_path())
    {
        Ok(s) => Arc::new(s),
        Err(e) => {
            warn!("trending store unavailable ({e}); counting in memory for this session");
            match SqliteTrendingStore::open_in_memory() {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    error!("in-memory trending store failed: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let prefs = SessionPrefs::load(cfg.session_prefs_path());
    let mut app = DiscoveryApp::new(&cfg, client, store, prefs);

    // stdin is read on its own thread so the loop keeps ticking
    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("{HELP}");
    app.start();

    let mut stdout = io::stdout();
    loop {
        match line_rx.recv_timeout(TICK) {
            Ok(line) => match parse_command(line.trim_end_matches(['\r', '\n'])) {
                Some(Command::Search(term)) => app.set_search_term(term, Instant::now()),
                Some(Command::Nav(nav)) => {
                    if !app.navigate(nav) {
                        println!("(navigation ignored)");
                    }
                }
                Some(Command::Detail(id)) => app.open_details(id),
                Some(Command::CloseDetail) => app.close_details(),
                Some(Command::Trending) => app.refresh_trending(),
                Some(Command::Help) => println!("{HELP}"),
                Some(Command::Quit) => break,
                None => println!("unknown command; :help lists them"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // stdin closed: let pending work settle, then exit
                if !app.debounce_pending() && !app.is_loading() {
                    break;
                }
                std::thread::sleep(TICK);
            }
        }

        if app.tick(Instant::now()) {
            if let Err(e) = render(&app, &mut stdout) {
                warn!("stdout write failed: {e}");
                break;
            }
        }
    }

    app.shutdown();
    info!("bye");
    ExitCode::SUCCESS
}
