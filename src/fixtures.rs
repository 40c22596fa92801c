#[cfg(test)]
pub mod test {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use confique::Config;
    use serde::{Deserialize, Serialize};

    use crate::args::PositionalArgs;
    use crate::command::{Applicant, Command, args, run, short, sub, valid_args};
    use crate::flag::{boolean, duration, flag, int, string};
    use crate::settings::Binding;
    use crate::types::FlagValue;

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct PortConfig {
        /// The application host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,
    }

    pub fn binding(key: &str, default: FlagValue, path: &[&str]) -> Binding {
        Binding {
            key: key.to_string(),
            flag: key.to_string(),
            env_var: None,
            default,
            path: path.iter().map(|s| s.to_string()).collect(),
            persistent: false,
        }
    }

    /// What a run callback saw, captured for assertions.
    #[derive(Debug, Clone, Default)]
    pub struct Seen {
        pub path: Vec<String>,
        pub args: Vec<String>,
        pub port: Option<i64>,
        pub verbose: Option<bool>,
        pub timeout: Option<Duration>,
    }

    pub type Recorder = Arc<Mutex<Vec<Seen>>>;

    fn record(recorder: &Recorder) -> Applicant {
        let recorder = Arc::clone(recorder);
        run(move |inv| {
            let settings = inv.settings();
            recorder.lock().unwrap().push(Seen {
                path: inv.path().to_vec(),
                args: inv.args().to_vec(),
                port: settings.get_int("port"),
                verbose: settings.get_bool("verbose"),
                timeout: settings.get_duration("timeout"),
            });
            Ok(())
        })
    }

    /// `app` with a persistent `--verbose`, a `serve` command with env-bound
    /// `--port` and `--timeout`, and a `db migrate` pair.
    pub fn sample_tree(recorder: &Recorder) -> Command {
        Command::new(
            "app",
            [
                short("Sample application"),
                flag("verbose", boolean(false))
                    .abbr('v')
                    .persistent()
                    .env()
                    .into(),
                sub(
                    "serve",
                    [
                        short("Start the server"),
                        flag("port", int(8080)).abbr('p').env().into(),
                        flag("timeout", duration(Duration::from_secs(30)))
                            .env()
                            .into(),
                        flag("bind", string("127.0.0.1")).into(),
                        args(PositionalArgs::None),
                        record(recorder),
                    ],
                ),
                sub(
                    "db",
                    [
                        short("Database commands"),
                        sub(
                            "migrate [up|down]",
                            [
                                short("Run migrations"),
                                valid_args(["up", "down"]),
                                args(PositionalArgs::and([
                                    PositionalArgs::Max(1),
                                    PositionalArgs::OnlyValid,
                                ])),
                                record(recorder),
                            ],
                        ),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn port_config_loads_defaults() {
        let config = PortConfig::builder().load().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
    }
}
