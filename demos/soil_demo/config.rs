//! Typed view of the demo's bound flags.
//!
//! The `serve` flags bind into dotted keys (`server.host`, `server.port`,
//! ...), so the resolved settings nest the same way this struct does and
//! [`Settings::extract`](clapsoil::Settings::extract) can fill it directly.
//!
//! | Flag          | Key                 | Env var (prefix `SOIL_DEMO`)    |
//! |---------------|---------------------|---------------------------------|
//! | `--host`      | `server.host`       | `SOIL_DEMO__SERVER__HOST`       |
//! | `--port`      | `server.port`       | `SOIL_DEMO__SERVER__PORT`       |
//! | `--timeout`   | `server.timeout`    | `SOIL_DEMO__SERVER__TIMEOUT`    |
//! | `--color`     | `display.color`     | `SOIL_DEMO__DISPLAY__COLOR`     |

use confique::Config;

#[derive(Config, Debug)]
pub struct DemoConfig {
    #[config(nested)]
    pub server: ServerConfig,

    #[config(nested)]
    pub display: DisplayConfig,
}

#[derive(Config, Debug)]
pub struct ServerConfig {
    /// Hostname to bind to.
    #[config(default = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[config(default = 8080)]
    pub port: u16,

    /// Idle timeout, in the `1m30s` notation.
    #[config(default = "30s")]
    pub timeout: String,
}

#[derive(Config, Debug)]
pub struct DisplayConfig {
    /// Banner color (red, green, yellow, blue, magenta, cyan).
    #[config(default = "yellow")]
    pub color: String,
}
