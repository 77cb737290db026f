use lull::commands;
use lull::logging;
use lull::session::CountdownSession;
use lull_core::config::Settings;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();

    let (mut session, mut events) = CountdownSession::persistent(Settings::load());
    println!("{}", session.display());
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(raw) = line.map_err(|e| e.to_string())? else {
                    break;
                };
                let line = raw.trim();
                if !line.is_empty() {
                    match commands::respond(line, &mut session) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(err) => println!("{err}"),
                    }
                }
                prompt()?;
            }
            _ = session.next_tick() => {}
            Some(event) = events.recv() => {
                if let Some(out) = session.handle_event(&event) {
                    println!("{out}");
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

fn prompt() -> Result<(), String> {
    write!(std::io::stdout(), "> ").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())
}
