use std::io::Write;
use std::rc::Rc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use pdscript::cli;
use pdscript::{BridgeHandle, ConsoleHost, Host, HostMessage};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("pdscript: {e}");
            eprintln!("Usage: pdscript [-f[<file>]] [-c<chunk>] [-qd] [<script>...]");
            std::process::exit(1);
        }
    };

    init_tracing(args.debug);

    let (config, warnings) = cli::load_config(&args.config);
    for w in warnings {
        eprintln!("pdscript: warning: {w}");
    }

    if !args.quiet {
        let ver = env!("CARGO_PKG_VERSION");
        println!("pdscript {ver} (Lua 5.4)");
        println!("Messages: bang | load <path> | call <fn> <args...> | <numbers...>");
    }

    let host: Rc<dyn Host> = Rc::new(ConsoleHost);
    let mut node = match BridgeHandle::new(host, config) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("pdscript: cannot start Lua: {e}");
            std::process::exit(1);
        }
    };

    // ── Startup scripts and -c chunk ──────────────────────────────────────────
    for script in &args.scripts {
        node.load_path(script);
    }
    if let Some(chunk) = &args.command {
        node.eval(chunk);
    }

    // ── Message loop: one host message per stdin line ─────────────────────────
    // Each message runs to completion before the next line is read.
    let interactive = unsafe { libc::isatty(libc::STDIN_FILENO) != 0 };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("> ");
            let _ = std::io::stdout().flush();
        }
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&mut node, &line),
                Ok(None) => break,
                Err(e) => {
                    eprintln!("pdscript: stdin: {e}");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

fn handle_line(node: &mut BridgeHandle, line: &str) {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }
    match HostMessage::parse(line) {
        Ok(msg) => node.receive_message(msg.atoms()),
        Err(e) => eprintln!("error: {e}"),
    }
}

/// Log to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing(debug: bool) {
    let default = if debug { "pdscript=debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
