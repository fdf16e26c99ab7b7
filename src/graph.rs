// SPDX-License-Identifier: MIT OR Apache-2.0

//! The live logger graph: named nodes, each with a level and the sinks attached to it.
//!
//! A graph is built once from a [`ResolvedConfig`] and never rebuilt. Lookups are by
//! logger name through a `HashMap`; unknown names fall back to the root node.

use crate::Level;
use crate::config::{ROOT_LOGGER, ResolvedConfig};
use crate::console_sink::ConsoleSink;
use crate::error::Error;
use crate::file_sink::RotatingFileSink;
use crate::format::RecordFormatter;
use crate::log_record::LogRecord;
use crate::sink::Sink;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

#[derive(Debug)]
pub(crate) struct Node {
    level: Level,
    propagate: bool,
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
}

impl Node {
    fn new(level: Level, propagate: bool, sinks: Vec<Arc<dyn Sink>>) -> Arc<Self> {
        Arc::new(Self {
            level,
            propagate,
            sinks: RwLock::new(sinks),
        })
    }

    pub(crate) fn level(&self) -> Level {
        self.level
    }

    fn sinks(&self) -> Vec<Arc<dyn Sink>> {
        self.sinks.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn sink_count(&self) -> usize {
        self.sinks.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[derive(Debug)]
pub(crate) struct Graph {
    root: Arc<Node>,
    nodes: HashMap<String, Arc<Node>>,
    files_opened: usize,
}

impl Graph {
    /// Opens every enabled sink and wires the nodes. Nothing is shared until this returns.
    pub(crate) fn build(resolved: &ResolvedConfig, formatter: &RecordFormatter) -> Result<Graph, Error> {
        let mut opened: HashMap<&str, Arc<dyn Sink>> = HashMap::with_capacity(resolved.sinks.len());
        for sink in &resolved.sinks {
            let file = RotatingFileSink::open(
                &sink.path,
                sink.level,
                formatter.clone(),
                sink.max_bytes,
                sink.backup_count,
            )?;
            opened.insert(sink.key.as_str(), Arc::new(file));
        }

        let mut nodes = HashMap::with_capacity(resolved.loggers.len() + resolved.external.len());
        let mut claimed = Vec::new();
        for logger in &resolved.loggers {
            // a sink that exists but is disabled is simply not attached
            let sinks: Vec<Arc<dyn Sink>> = logger
                .sink_keys
                .iter()
                .filter_map(|key| opened.get(key.as_str()).cloned())
                .collect();
            claimed.extend(logger.sink_keys.iter().map(String::as_str));
            nodes.insert(logger.name.clone(), Node::new(logger.level, logger.propagate, sinks));
        }

        let mut root_sinks: Vec<Arc<dyn Sink>> = Vec::new();
        if let Some(console) = resolved.console {
            root_sinks.push(Arc::new(ConsoleSink::new(console, formatter.clone())));
        }
        for sink in &resolved.sinks {
            if !claimed.contains(&sink.key.as_str()) {
                if let Some(file) = opened.get(sink.key.as_str()) {
                    root_sinks.push(file.clone());
                }
            }
        }

        for (name, level) in &resolved.external {
            nodes
                .entry(name.clone())
                .or_insert_with(|| Node::new(*level, true, Vec::new()));
        }

        Ok(Graph {
            root: Node::new(resolved.root_level, false, root_sinks),
            nodes,
            files_opened: opened.len(),
        })
    }

    /// The node for `name`, or the root node.
    pub(crate) fn node(&self, name: &str) -> &Arc<Node> {
        if name == ROOT_LOGGER {
            return &self.root;
        }
        self.nodes.get(name).unwrap_or(&self.root)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        name == ROOT_LOGGER || self.nodes.contains_key(name)
    }

    /// Writes `record` to the node's sinks and, when the node propagates, to the root's.
    ///
    /// Returns whether any sink took the record. The node's level has already been checked;
    /// the root's level is not applied to propagated records, only each sink's floor.
    /// The root node never propagates.
    pub(crate) fn write(&self, node: &Node, record: &LogRecord) -> bool {
        let own = node.sinks();
        let mut written = false;
        for sink in &own {
            if sink.accepts(record.level()) {
                sink.finish_log_record(record);
                written = true;
            }
        }
        if node.propagate {
            for sink in self.root.sinks() {
                let duplicate = own.iter().any(|s| std::ptr::addr_eq(Arc::as_ptr(s), Arc::as_ptr(&sink)));
                if !duplicate && sink.accepts(record.level()) {
                    sink.finish_log_record(record);
                    written = true;
                }
            }
        }
        written
    }

    /// Adds a sink to an existing node. Returns `false` when there is no node of that name.
    pub(crate) fn attach(&self, name: &str, sink: Arc<dyn Sink>) -> bool {
        if !self.contains(name) {
            return false;
        }
        let node = self.node(name);
        node.sinks.write().unwrap_or_else(|e| e.into_inner()).push(sink);
        true
    }

    pub(crate) fn flush(&self) {
        self.root.sinks().iter().for_each(|s| s.prepare_to_die());
        for node in self.nodes.values() {
            node.sinks().iter().for_each(|s| s.prepare_to_die());
        }
    }

    pub(crate) fn files_opened(&self) -> usize {
        self.files_opened
    }

    /// Logger name → number of sinks attached directly to it.
    pub(crate) fn summary(&self) -> BTreeMap<String, usize> {
        let mut summary: BTreeMap<String, usize> = self
            .nodes
            .iter()
            .map(|(name, node)| (name.clone(), node.sink_count()))
            .collect();
        summary.insert(ROOT_LOGGER.to_string(), self.root.sink_count());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggerNames, LoggerSpec, LoggingConfig, LoggingPresets};
    use crate::inmemory_sink::InMemorySink;

    fn build(mut config: LoggingConfig) -> (Graph, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        config.logs_dir = dir.path().to_path_buf();
        config.console_enabled = false;
        let graph = Graph::build(&config.resolve().unwrap(), &config.formatter()).unwrap();
        (graph, dir)
    }

    fn record(level: Level, message: &str) -> LogRecord {
        let mut record = LogRecord::new(level, "test");
        record.log(message);
        record
    }

    #[test]
    fn default_graph_wiring() {
        let (graph, _dir) = build(LoggingConfig::default());
        let summary = graph.summary();
        // app and errors are claimed by no logger
        assert_eq!(summary["root"], 2);
        assert_eq!(summary[LoggerNames::API], 1);
        assert_eq!(summary[LoggerNames::PERFORMANCE], 1);
        assert_eq!(summary["uvicorn"], 0);
        assert_eq!(graph.files_opened(), 7);
    }

    #[test]
    fn unknown_names_fall_back_to_root() {
        let (graph, _dir) = build(LoggingPresets::minimal());
        assert!(std::ptr::eq(graph.node("nobody"), graph.node(ROOT_LOGGER)));
        assert!(!graph.contains("nobody"));
        assert!(!graph.attach("nobody", Arc::new(InMemorySink::new())));
    }

    #[test]
    fn propagation_reaches_root_sinks_only_when_enabled() {
        let (graph, _dir) = build(LoggingConfig::default());
        let root = Arc::new(InMemorySink::new());
        let api = Arc::new(InMemorySink::new());
        let perf = Arc::new(InMemorySink::new());
        assert!(graph.attach(ROOT_LOGGER, root.clone()));
        assert!(graph.attach(LoggerNames::API, api.clone()));
        assert!(graph.attach(LoggerNames::PERFORMANCE, perf.clone()));

        graph.write(graph.node(LoggerNames::API), &record(Level::Info, "from api"));
        graph.write(graph.node(LoggerNames::PERFORMANCE), &record(Level::Info, "from perf"));

        assert_eq!(api.len(), 1);
        assert_eq!(perf.len(), 1);
        let root_lines = root.drain_logs();
        assert!(root_lines.contains("from api"));
        assert!(!root_lines.contains("from perf"));
    }

    #[test]
    fn a_sink_on_both_ends_gets_one_copy() {
        let (graph, _dir) = build(LoggingConfig::default());
        let shared = Arc::new(InMemorySink::new());
        graph.attach(ROOT_LOGGER, shared.clone());
        graph.attach(LoggerNames::DATABASE, shared.clone());
        graph.write(graph.node(LoggerNames::DATABASE), &record(Level::Warning, "once"));
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn sink_floors_apply_to_propagated_records() {
        let (graph, dir) = build(LoggingConfig::default());
        graph.write(graph.node(LoggerNames::API), &record(Level::Info, "routine"));
        graph.write(graph.node(LoggerNames::API), &record(Level::Error, "broken"));
        graph.flush();
        let errors = std::fs::read_to_string(dir.path().join("errors.log")).unwrap();
        assert!(!errors.contains("routine"));
        assert!(errors.contains("broken"));
        let app = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(app.contains("routine"));
    }

    #[test]
    fn disabled_sinks_are_never_opened() {
        let (graph, dir) = build(LoggingPresets::production());
        assert!(!dir.path().join("api.log").exists());
        assert!(!dir.path().join("services.log").exists());
        assert!(dir.path().join("database.log").exists());
        assert_eq!(graph.summary()[LoggerNames::API], 0);
    }

    #[test]
    fn disabled_loggers_fall_back_to_root() {
        let mut config = LoggingConfig::default();
        config
            .loggers
            .insert("audit".to_string(), LoggerSpec::new("AuditLogger", &["api"]).disabled());
        let (graph, dir) = build(config);
        assert!(!graph.contains("AuditLogger"));
        assert!(std::ptr::eq(graph.node("AuditLogger"), graph.node(ROOT_LOGGER)));

        let root = Arc::new(InMemorySink::new());
        let api = Arc::new(InMemorySink::new());
        graph.attach(ROOT_LOGGER, root.clone());
        graph.attach(LoggerNames::API, api.clone());
        graph.write(graph.node("AuditLogger"), &record(Level::Info, "audit entry"));
        graph.flush();

        assert!(root.drain_logs().contains("audit entry"));
        assert!(api.is_empty());
        let api_file = std::fs::read_to_string(dir.path().join("api.log")).unwrap();
        assert!(!api_file.contains("audit entry"));
        let app_file = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(app_file.contains("audit entry"));
    }
}
