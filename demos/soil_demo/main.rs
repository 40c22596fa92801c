//! # clapsoil demo application
//!
//! A sample CLI built from a declarative command tree. It exists to exercise
//! the crate by hand, not to do anything useful.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example soil_demo -- serve
//! cargo run --example soil_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                  |
//! |-------------------------|---------------------------------------------------------------------|
//! | Declared defaults       | `cargo run --example soil_demo -- serve`                            |
//! | Env var fallback        | `SOIL_DEMO__SERVER__PORT=9999 cargo run --example soil_demo -- serve` |
//! | Explicit env var        | `DEMO_TOKEN=s3cret cargo run --example soil_demo -- serve`          |
//! | Command-line value      | `cargo run --example soil_demo -- serve -p 3000 --timeout 1m30s`    |
//! | Persistent log flags    | `cargo run --example soil_demo -- -l debug serve`                   |
//! | Log file                | `cargo run --example soil_demo -- serve --logfile demo.log`         |
//! | Positional rules        | `cargo run --example soil_demo -- greet alice bob`                  |
//! | Valid args              | `cargo run --example soil_demo -- paint teal`                       |
//! | Version                 | `cargo run --example soil_demo -- version`                          |
//! | Completion              | `cargo run --example soil_demo -- completion zsh`                   |
//! | Deprecated command      | `cargo run --example soil_demo -- start`                            |
//! | Help when no callback   | `cargo run --example soil_demo -- admin`                            |

mod config;

use std::process;
use std::time::Duration;

use clapsoil::{
    Applicant, Command, Invocation, PositionalArgs, RunError, aliases, args,
    configure_default_logging, defaults, deprecated, duration, flag, hidden, int, long, run, short,
    string, sub, valid_args,
};

use config::DemoConfig;

const COLORS: [&str; 6] = ["red", "green", "yellow", "blue", "magenta", "cyan"];

fn ansi_color_code(name: &str) -> &str {
    match name {
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        "blue" => "\x1b[34m",
        "magenta" => "\x1b[35m",
        "cyan" => "\x1b[36m",
        _ => "\x1b[0m",
    }
}

const RESET: &str = "\x1b[0m";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn serve(inv: &mut Invocation<'_>) -> Result<(), RunError> {
    let logger = configure_default_logging(inv.settings())?;
    let config: DemoConfig = inv.settings().extract()?;
    let token = inv.settings().get_str("token").unwrap_or_default().to_string();

    logger.in_scope(|| {
        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            "resolved server settings"
        );
        if token.is_empty() {
            tracing::warn!("no API token configured");
        }
    });

    let color = ansi_color_code(&config.display.color);
    let out = inv.out();
    writeln!(
        out,
        "{color}serving on {}:{}{RESET} (idle timeout {})",
        config.server.host, config.server.port, config.server.timeout
    )?;
    for key in ["server.host", "server.port", "server.timeout", "display.color"] {
        if let Some(origin) = inv.settings().origin(key) {
            writeln!(inv.out(), "  {key:<16} {origin:?}")?;
        }
    }
    Ok(())
}

fn greet(inv: &mut Invocation<'_>) -> Result<(), RunError> {
    let names = inv.args().join(", ");
    writeln!(inv.out(), "Hello, {names}!")?;
    Ok(())
}

fn paint(inv: &mut Invocation<'_>) -> Result<(), RunError> {
    let color = inv.args().first().cloned().unwrap_or_default();
    let code = ansi_color_code(&color);
    writeln!(inv.out(), "{code}{color}{RESET}")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

fn serve_command() -> Applicant {
    sub(
        "serve",
        [
            short("Pretend to start a server"),
            long(
                "Resolves the server settings from flags, environment and defaults \
                 and prints where each value came from.",
            ),
            aliases(["run"]),
            flag("host", string("127.0.0.1"))
                .description("Hostname to bind to")
                .env_name("server.host")
                .into(),
            flag("port", int(8080))
                .abbr('p')
                .description("Port to listen on")
                .env_name("server.port")
                .into(),
            flag("timeout", duration(Duration::from_secs(30)))
                .description("Idle timeout")
                .env_name("server.timeout")
                .into(),
            flag("token", string(""))
                .description("API token")
                .env_var("DEMO_TOKEN")
                .into(),
            args(PositionalArgs::None),
            run(serve),
        ],
    )
}

fn tree() -> Command {
    let mut root = Command::new(
        "soil-demo",
        [
            short("clapsoil demo, a sample CLI built from a command tree"),
            defaults(env!("CARGO_PKG_VERSION"), "dev"),
            flag("color", string("yellow"))
                .description("Banner color")
                .persistent()
                .env_name("display.color")
                .into(),
            serve_command(),
            sub(
                "greet <name>...",
                [
                    short("Greet one or more people"),
                    args(PositionalArgs::Range { min: 1, max: 3 }),
                    run(greet),
                ],
            ),
            sub(
                "paint [color]",
                [
                    short("Print a color name in its color"),
                    valid_args(COLORS),
                    args(PositionalArgs::and([
                        PositionalArgs::one(),
                        PositionalArgs::OnlyValid,
                    ])),
                    run(paint),
                ],
            ),
            sub(
                "start",
                [
                    deprecated("use \"serve\" instead"),
                    args(PositionalArgs::None),
                    run(serve),
                ],
            ),
        ],
    );

    root.sub("admin", [short("Administrative commands")]).sub(
        "purge",
        [
            short("Forget everything"),
            hidden(),
            run(|inv| {
                writeln!(inv.out(), "nothing to purge")?;
                Ok(())
            }),
        ],
    );
    root
}

fn main() {
    let cli = match tree().compile() {
        Ok(cli) => cli.env_prefix("SOIL_DEMO"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    cli.execute();
}
