//! The command-tree builder.
//!
//! A [`Command`] is an inspectable description of one command: its name, an
//! ordered list of [`Declaration`]s (command options and flags) and its child
//! commands. Trees are assembled from [`Applicant`]s, the only composition
//! primitive, and lowered into a clap command by
//! [`compile`](Command::compile).

use std::fmt;
use std::sync::Arc;

use crate::args::PositionalArgs;
use crate::cli::{Cli, Invocation};
use crate::error::{RunError, SoilError};
use crate::flag::FlagSpec;
use crate::lower;

/// Callback invoked when a command is dispatched.
pub type RunFn = Arc<dyn Fn(&mut Invocation<'_>) -> Result<(), RunError> + Send + Sync>;

/// A command-level setting.
#[derive(Clone)]
pub enum CommandOption {
    Short(String),
    Long(String),
    Aliases(Vec<String>),
    ValidArgs(Vec<String>),
    Hidden,
    Deprecated(String),
    Args(PositionalArgs),
    Run(RunFn),
}

impl fmt::Debug for CommandOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOption::Short(s) => f.debug_tuple("Short").field(s).finish(),
            CommandOption::Long(s) => f.debug_tuple("Long").field(s).finish(),
            CommandOption::Aliases(a) => f.debug_tuple("Aliases").field(a).finish(),
            CommandOption::ValidArgs(v) => f.debug_tuple("ValidArgs").field(v).finish(),
            CommandOption::Hidden => f.write_str("Hidden"),
            CommandOption::Deprecated(m) => f.debug_tuple("Deprecated").field(m).finish(),
            CommandOption::Args(rule) => f.debug_tuple("Args").field(rule).finish(),
            CommandOption::Run(_) => f.write_str("Run(..)"),
        }
    }
}

/// One entry in a command's ordered declaration list.
#[derive(Debug, Clone)]
pub enum Declaration {
    Option(CommandOption),
    Flag(FlagSpec),
}

/// A unit of configuration applied to a [`Command`] at construction time.
#[derive(Debug, Clone)]
pub enum Applicant {
    Option(CommandOption),
    Flag(FlagSpec),
    Sub(Command),
    Group(Vec<Applicant>),
}

impl From<FlagSpec> for Applicant {
    fn from(spec: FlagSpec) -> Self {
        Applicant::Flag(spec)
    }
}

impl From<CommandOption> for Applicant {
    fn from(option: CommandOption) -> Self {
        Applicant::Option(option)
    }
}

impl From<Command> for Applicant {
    fn from(command: Command) -> Self {
        Applicant::Sub(command)
    }
}

/// A command in the builder tree.
#[derive(Debug, Clone)]
pub struct Command {
    name: String,
    usage: Option<String>,
    declarations: Vec<Declaration>,
    subcommands: Vec<Command>,
}

impl Command {
    /// Create a command from a use line and apply `applicants` in order.
    ///
    /// The first word of the use line is the command name; the rest labels
    /// the positional arguments in help (`"completion [bash|zsh]"`).
    pub fn new(use_line: impl AsRef<str>, applicants: impl IntoIterator<Item = Applicant>) -> Self {
        let use_line = use_line.as_ref().trim();
        let (name, usage) = match use_line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name.to_string(), Some(rest.trim().to_string())),
            None => (use_line.to_string(), None),
        };
        let mut command = Self {
            name,
            usage,
            declarations: Vec::new(),
            subcommands: Vec::new(),
        };
        command.apply(applicants);
        command
    }

    /// Apply more applicants to this command, in order.
    pub fn apply(&mut self, applicants: impl IntoIterator<Item = Applicant>) -> &mut Self {
        for applicant in applicants {
            self.apply_one(applicant);
        }
        self
    }

    fn apply_one(&mut self, applicant: Applicant) {
        match applicant {
            Applicant::Option(option) => self.declarations.push(Declaration::Option(option)),
            Applicant::Flag(spec) => self.declarations.push(Declaration::Flag(spec)),
            Applicant::Sub(command) => self.subcommands.push(command),
            Applicant::Group(group) => {
                self.apply(group);
            }
        }
    }

    /// Create a child command, append it, and return it for further chaining.
    pub fn sub(
        &mut self,
        use_line: impl AsRef<str>,
        applicants: impl IntoIterator<Item = Applicant>,
    ) -> &mut Command {
        self.subcommands.push(Command::new(use_line, applicants));
        let last = self.subcommands.len() - 1;
        &mut self.subcommands[last]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text after the name in the use line, if any.
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn subcommands(&self) -> &[Command] {
        &self.subcommands
    }

    /// Flag declarations in declaration order.
    pub fn flags(&self) -> impl Iterator<Item = &FlagSpec> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Flag(spec) => Some(spec),
            Declaration::Option(_) => None,
        })
    }

    /// Find a descendant by its names below this command.
    pub fn find(&self, path: &[&str]) -> Option<&Command> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .subcommands
                .iter()
                .find(|c| c.name == *head)
                .and_then(|c| c.find(rest)),
        }
    }

    pub(crate) fn into_parts(self) -> (String, Option<String>, Vec<Declaration>, Vec<Command>) {
        (self.name, self.usage, self.declarations, self.subcommands)
    }

    /// Lower the tree into a ready-to-run [`Cli`].
    pub fn compile(self) -> Result<Cli, SoilError> {
        lower::compile(self)
    }
}

/// Short description shown in command lists.
pub fn short(text: impl Into<String>) -> Applicant {
    CommandOption::Short(text.into()).into()
}

/// Long description shown in the command's own help.
pub fn long(text: impl Into<String>) -> Applicant {
    CommandOption::Long(text.into()).into()
}

pub fn aliases<I, S>(names: I) -> Applicant
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CommandOption::Aliases(names.into_iter().map(Into::into).collect()).into()
}

/// Accepted positional values, checked by [`PositionalArgs::OnlyValid`].
pub fn valid_args<I, S>(values: I) -> Applicant
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CommandOption::ValidArgs(values.into_iter().map(Into::into).collect()).into()
}

pub fn hidden() -> Applicant {
    CommandOption::Hidden.into()
}

pub fn deprecated(message: impl Into<String>) -> Applicant {
    CommandOption::Deprecated(message.into()).into()
}

pub fn args(rule: PositionalArgs) -> Applicant {
    CommandOption::Args(rule).into()
}

pub fn run<F>(callback: F) -> Applicant
where
    F: Fn(&mut Invocation<'_>) -> Result<(), RunError> + Send + Sync + 'static,
{
    CommandOption::Run(Arc::new(callback)).into()
}

/// A child command as an applicant.
pub fn sub(use_line: impl AsRef<str>, applicants: impl IntoIterator<Item = Applicant>) -> Applicant {
    Command::new(use_line, applicants).into()
}

/// Bundle several applicants into one.
pub fn group(applicants: impl IntoIterator<Item = Applicant>) -> Applicant {
    Applicant::Group(applicants.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::{flag, int, string};

    fn names(command: &Command) -> Vec<&str> {
        command.subcommands().iter().map(Command::name).collect()
    }

    #[test]
    fn new_applies_in_order() {
        let cmd = Command::new("app", [short("first"), short("second")]);
        let shorts: Vec<_> = cmd
            .declarations()
            .iter()
            .filter_map(|d| match d {
                Declaration::Option(CommandOption::Short(s)) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(shorts, vec!["first", "second"]);
    }

    #[test]
    fn use_line_splits_name_and_usage() {
        let cmd = Command::new("completion [bash|zsh|fish|powershell]", []);
        assert_eq!(cmd.name(), "completion");
        assert_eq!(cmd.usage(), Some("[bash|zsh|fish|powershell]"));
        let plain = Command::new("serve", []);
        assert_eq!(plain.usage(), None);
    }

    #[test]
    fn sub_returns_child_for_chaining() {
        let mut root = Command::new("app", []);
        root.sub("db", [short("database")])
            .sub("migrate", [])
            .apply([short("run migrations")]);
        assert_eq!(names(&root), vec!["db"]);
        let migrate = root.find(&["db", "migrate"]).unwrap();
        assert_eq!(migrate.declarations().len(), 1);
    }

    #[test]
    fn sibling_order_follows_declaration() {
        let mut root = Command::new("app", [sub("a", []), sub("b", [])]);
        root.sub("c", []);
        assert_eq!(names(&root), vec!["a", "b", "c"]);
    }

    #[test]
    fn group_flattens_into_target() {
        let cmd = Command::new(
            "app",
            [group([
                short("x"),
                flag("port", int(80)).into(),
                sub("child", []),
            ])],
        );
        assert_eq!(cmd.declarations().len(), 2);
        assert_eq!(names(&cmd), vec!["child"]);
    }

    #[test]
    fn flags_iterates_declared_flags() {
        let cmd = Command::new(
            "app",
            [
                flag("a", string("")).into(),
                short("desc"),
                flag("b", string("")).into(),
            ],
        );
        let flags: Vec<_> = cmd.flags().map(FlagSpec::name).collect();
        assert_eq!(flags, vec!["a", "b"]);
    }

    #[test]
    fn find_missing_path() {
        let cmd = Command::new("app", [sub("a", [])]);
        assert!(cmd.find(&["nope"]).is_none());
        assert_eq!(cmd.find(&[]).unwrap().name(), "app");
    }

    #[test]
    fn run_option_debug_is_opaque() {
        let applicant = run(|_| Ok(()));
        assert_eq!(format!("{applicant:?}"), "Option(Run(..))");
    }
}
