//! Blocking client for the Proxmox VE `pvesh` management CLI.
//!
//! Every call shells out to `pvesh <method> <path> --key=value ...
//! --output-format=json` and parses stdout as JSON. Empty stdout is an
//! empty record. A non-zero exit becomes [`Error::Command`], whose text
//! includes the failing command line and captured stderr; that text is
//! the only channel callers have for recognizing "resource not found"
//! answers from the platform.

mod error;
mod runner;

pub use error::Error;
pub use runner::{CommandOutput, ProcessRunner, Runner};

use serde_json::{Map, Value};

/// Default location of the management CLI on a PVE node.
pub const DEFAULT_COMMAND: &str = "/usr/bin/pvesh";

/// Ordered option bag, appended to the command line as `--key=value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(Vec<(String, String)>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Options::push`].
    pub fn add(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Options {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.push(k, v);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        options.extend(iter);
        options
    }
}

/// The four pvesh methods the resource managers use.
pub trait Client {
    fn get(&self, path: &str, options: &Options) -> Result<Value, Error>;
    fn create(&self, path: &str, options: &Options) -> Result<Value, Error>;
    fn set(&self, path: &str, options: &Options) -> Result<Value, Error>;
    fn delete(&self, path: &str, options: &Options) -> Result<Value, Error>;
}

/// `pvesh` invoker. Generic over [`Runner`] so tests can substitute a
/// scripted transport.
#[derive(Debug, Clone)]
pub struct Pvesh<R = ProcessRunner> {
    command: String,
    runner: R,
}

impl Pvesh<ProcessRunner> {
    pub fn new() -> Self {
        Self::with_runner(ProcessRunner)
    }
}

impl Default for Pvesh<ProcessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Runner> Pvesh<R> {
    pub fn with_runner(runner: R) -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            runner,
        }
    }

    /// Override the pvesh binary location.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    fn argv(&self, method: &str, path: &str, options: &Options) -> Vec<String> {
        let mut argv = vec![
            self.command.clone(),
            method.to_string(),
            path.to_lowercase(),
        ];
        for (name, value) in options.iter() {
            argv.push(format!("--{name}={value}"));
        }
        argv.push("--output-format=json".to_string());
        argv
    }

    fn invoke(&self, method: &str, path: &str, options: &Options) -> Result<Value, Error> {
        let argv = self.argv(method, path, options);
        let command = argv.join(" ");
        tracing::debug!(%command, "running pvesh");

        let output = self
            .runner
            .run(&argv)
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.success {
            return Err(Error::Command {
                command,
                stderr: output.stderr.trim_end().to_string(),
            });
        }

        if output.stdout.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_str(&output.stdout).map_err(|source| Error::Decode {
            command,
            stdout: output.stdout.clone(),
            source,
        })
    }
}

impl<R: Runner> Client for Pvesh<R> {
    fn get(&self, path: &str, options: &Options) -> Result<Value, Error> {
        self.invoke("get", path, options)
    }

    fn create(&self, path: &str, options: &Options) -> Result<Value, Error> {
        self.invoke("create", path, options)
    }

    fn set(&self, path: &str, options: &Options) -> Result<Value, Error> {
        self.invoke("set", path, options)
    }

    fn delete(&self, path: &str, options: &Options) -> Result<Value, Error> {
        self.invoke("delete", path, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;

    struct ScriptedRunner {
        script: RefCell<VecDeque<(Vec<&'static str>, CommandOutput)>>,
    }

    impl ScriptedRunner {
        fn new(script: Vec<(Vec<&'static str>, CommandOutput)>) -> Self {
            Self {
                script: RefCell::new(script.into()),
            }
        }
    }

    impl Runner for ScriptedRunner {
        fn run(&self, argv: &[String]) -> io::Result<CommandOutput> {
            let (expected, output) = self
                .script
                .borrow_mut()
                .pop_front()
                .expect("unexpected pvesh invocation");
            assert_eq!(argv, expected.as_slice());
            Ok(output)
        }
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn builds_command_line_in_declared_order() {
        let runner = ScriptedRunner::new(vec![(
            vec![
                "/usr/bin/pvesh",
                "create",
                "pools",
                "--poolid=k8s",
                "--comment=k8s pool",
                "--output-format=json",
            ],
            ok(""),
        )]);
        let client = Pvesh::with_runner(runner);
        let options = Options::new().add("poolid", "k8s").add("comment", "k8s pool");
        let value = client.create("pools", &options).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn lowercases_the_path() {
        let runner = ScriptedRunner::new(vec![(
            vec!["/usr/bin/pvesh", "get", "cluster/options", "--output-format=json"],
            ok(r#"{"keyboard":"en-us"}"#),
        )]);
        let client = Pvesh::with_runner(runner);
        let value = client.get("Cluster/Options", &Options::new()).unwrap();
        assert_eq!(value["keyboard"], "en-us");
    }

    #[test]
    fn empty_stdout_is_an_empty_record() {
        let runner = ScriptedRunner::new(vec![(
            vec!["/usr/bin/pvesh", "set", "cluster/options", "--output-format=json"],
            ok("\n"),
        )]);
        let client = Pvesh::with_runner(runner);
        let value = client.set("cluster/options", &Options::new()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn nonzero_exit_reports_command_and_stderr() {
        let runner = ScriptedRunner::new(vec![(
            vec![
                "/usr/bin/pvesh",
                "get",
                "cluster/ha/groups/web",
                "--output-format=json",
            ],
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: "no such ha group 'web'\n".to_string(),
            },
        )]);
        let client = Pvesh::with_runner(runner);
        let err = client
            .get("cluster/ha/groups/web", &Options::new())
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("cluster/ha/groups/web"), "{text}");
        assert!(text.contains("no such ha group 'web'"), "{text}");
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let runner = ScriptedRunner::new(vec![(
            vec!["/usr/bin/pvesh", "get", "pools", "--output-format=json"],
            ok("UPID:pve1:0001"),
        )]);
        let client = Pvesh::with_runner(runner);
        let err = client.get("pools", &Options::new()).unwrap_err();
        match err {
            Error::Decode { stdout, .. } => assert_eq!(stdout, "UPID:pve1:0001"),
            other => panic!("expected decode error, got {other}"),
        }
    }

    #[test]
    fn custom_command_path() {
        let runner = ScriptedRunner::new(vec![(
            vec!["/opt/pvesh", "delete", "pools", "--poolid=k8s", "--output-format=json"],
            ok(""),
        )]);
        let client = Pvesh::with_runner(runner).with_command("/opt/pvesh");
        client
            .delete("pools", &Options::new().add("poolid", "k8s"))
            .unwrap();
    }
}
