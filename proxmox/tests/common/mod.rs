//! Scripted stand-in for the pvesh client.
//!
//! Tests queue the exact calls they expect (method, path, options) plus
//! the canned reply for each; any deviation panics with the call that
//! broke the script.

use std::cell::RefCell;
use std::collections::VecDeque;

use pvesh::{Client, Error, Options};
use serde_json::Value;

struct Expectation {
    method: &'static str,
    path: String,
    options: Vec<(String, String)>,
    /// `Err` is the stderr text of a failing pvesh run.
    reply: Result<Value, String>,
}

#[derive(Default)]
pub struct FakeClient {
    script: RefCell<VecDeque<Expectation>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(
        &self,
        method: &'static str,
        path: &str,
        options: &[(&str, &str)],
        reply: Result<Value, &str>,
    ) {
        self.script.borrow_mut().push_back(Expectation {
            method,
            path: path.to_string(),
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            reply: reply.map_err(str::to_string),
        });
    }

    pub fn verify(&self) {
        let remaining = self.script.borrow().len();
        assert_eq!(remaining, 0, "{remaining} scripted calls never happened");
    }

    fn call(&self, method: &'static str, path: &str, options: &Options) -> Result<Value, Error> {
        let expectation = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected call: {method} {path}"));
        assert_eq!(method, expectation.method, "method for {path}");
        assert_eq!(path, expectation.path, "path for {method}");
        let got: Vec<(String, String)> = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(got, expectation.options, "options for {method} {path}");
        expectation.reply.map_err(|stderr| Error::Command {
            command: format!("/usr/bin/pvesh {method} {path}"),
            stderr,
        })
    }
}

impl Client for FakeClient {
    fn get(&self, path: &str, options: &Options) -> Result<Value, Error> {
        self.call("get", path, options)
    }

    fn create(&self, path: &str, options: &Options) -> Result<Value, Error> {
        self.call("create", path, options)
    }

    fn set(&self, path: &str, options: &Options) -> Result<Value, Error> {
        self.call("set", path, options)
    }

    fn delete(&self, path: &str, options: &Options) -> Result<Value, Error> {
        self.call("delete", path, options)
    }
}
