//! LAEFEX - headless host for the editor core.
//!
//! Usage:
//!   laefex check FILE
//!   laefex highlight FILE
//!   laefex complete FILE LINE COL
//!   laefex run FILE
//!
//! Configuration is read from `laefex.toml` in the working directory, or
//! from the path in `LAEFEX_CONFIG`.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use laefex_core::{EditorConfig, EditorSession, NoticeKind, Position, Workspace};

const USAGE: &str = "usage: laefex <check|highlight|complete|run> FILE [LINE COL]";

fn config_path() -> PathBuf {
    env::var_os("LAEFEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("laefex.toml"))
}

fn open(workspace: &mut Workspace, path: &Path) -> Option<()> {
    match workspace.open_file(path) {
        Ok(_) => Some(()),
        Err(e) => {
            log::error!("Failed to open file '{}': {}", path.display(), e);
            None
        }
    }
}

fn check(session: &EditorSession, path: &Path) -> ExitCode {
    let errors = session.diagnostics();
    for error in &errors {
        println!(
            "{}:{}:{}: invalid syntax",
            path.display(),
            error.line + 1,
            error.start + 1
        );
    }
    let symbols = session.symbols();
    log::info!(
        "{} functions, {} variables, {} syntax errors",
        symbols.functions.len(),
        symbols.variables.len(),
        errors.len()
    );
    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn highlight(session: &EditorSession) {
    for line in 0..session.buffer().len_lines() {
        let Some(highlights) = session.line_highlights(line) else {
            continue;
        };
        for span in &highlights.spans {
            println!("{}:{}-{} {:?}", line + 1, span.start, span.end(), span.style);
        }
    }
}

fn complete(session: &mut EditorSession, line: &str, col: &str) -> ExitCode {
    let (Ok(line), Ok(col)) = (line.parse::<usize>(), col.parse::<usize>()) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    session.set_cursor_position(Position::new(line.saturating_sub(1), col));
    session.trigger_completion();
    for candidate in &session.completion().candidates {
        println!("{candidate}");
    }
    ExitCode::SUCCESS
}

fn run(workspace: &mut Workspace) -> ExitCode {
    let Some(result) = workspace.run_active() else {
        return ExitCode::FAILURE;
    };
    if !workspace.output().text().is_empty() {
        println!("{}", workspace.output().text());
    }
    match result {
        Ok(output) if output.success() => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (Some(command), Some(file)) = (args.first(), args.get(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let config = match EditorConfig::load(&config_path()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let default_theme = config.default_theme.clone();

    let mut workspace = Workspace::new(config);
    if !workspace.available_themes().is_empty() {
        workspace.apply_theme(&default_theme);
    }
    let path = PathBuf::from(file);
    if open(&mut workspace, &path).is_none() {
        return ExitCode::FAILURE;
    }

    let code = if command == "run" {
        run(&mut workspace)
    } else {
        match (command.as_str(), workspace.active_session_mut()) {
            ("check", Some(session)) => check(session, &path),
            ("highlight", Some(session)) => {
                highlight(session);
                ExitCode::SUCCESS
            }
            ("complete", Some(session)) => match (args.get(2), args.get(3)) {
                (Some(line), Some(col)) => complete(session, line, col),
                _ => {
                    eprintln!("{USAGE}");
                    ExitCode::FAILURE
                }
            },
            _ => {
                eprintln!("{USAGE}");
                ExitCode::FAILURE
            }
        }
    };

    for notice in workspace.take_notices() {
        match notice.kind {
            NoticeKind::Info => log::info!("{}", notice.message),
            NoticeKind::Warning => log::warn!("{}", notice.message),
            NoticeKind::Error => log::error!("{}", notice.message),
        }
    }
    code
}
