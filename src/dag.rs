//! Task dependency graph built from manifest `depends_on` declarations

use crate::error::{AssetFlowError, Result};
use crate::models::TaskConfig;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// DAG engine for task dependency resolution
#[derive(Debug)]
pub struct DagEngine {
    graph: DiGraph<String, ()>,
    task_indices: HashMap<String, NodeIndex>,
}

impl DagEngine {
    /// Build DAG from task configurations
    pub fn build(tasks: &[TaskConfig]) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut task_indices = HashMap::new();

        // Create nodes for all tasks
        for task in tasks {
            let index = graph.add_node(task.name.clone());
            task_indices.insert(task.name.clone(), index);
        }

        // Create edges from dependencies
        for task in tasks {
            let task_index = task_indices[&task.name];
            for dep_name in &task.depends_on {
                let dep_index = task_indices[dep_name];
                // Edge from dependency to task (dep must complete before task)
                graph.add_edge(dep_index, task_index, ());
            }
        }

        let engine = Self {
            graph,
            task_indices,
        };

        // Validate DAG is acyclic
        engine.validate_acyclic()?;

        Ok(engine)
    }

    /// Validate that the graph is acyclic
    pub fn validate_acyclic(&self) -> Result<()> {
        if is_cyclic_directed(&self.graph) {
            // Find a cycle for better error message
            let cycle_info = self.find_cycle();
            return Err(AssetFlowError::CycleDetected(cycle_info));
        }
        Ok(())
    }

    /// Find a cycle in the graph for error reporting
    fn find_cycle(&self) -> String {
        // Simple DFS to find cycle
        let mut visited = HashMap::new();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if !visited.contains_key(&node) {
                if let Some(cycle) = self.dfs_find_cycle(node, &mut visited, &mut path) {
                    return cycle;
                }
            }
        }

        "Unknown cycle".to_string()
    }

    fn dfs_find_cycle(
        &self,
        node: NodeIndex,
        visited: &mut HashMap<NodeIndex, bool>,
        path: &mut Vec<String>,
    ) -> Option<String> {
        if let Some(&in_path) = visited.get(&node) {
            if in_path {
                // Found cycle
                let task_name = &self.graph[node];
                path.push(task_name.clone());
                return Some(path.join(" -> "));
            }
            return None;
        }

        visited.insert(node, true);
        path.push(self.graph[node].clone());

        for neighbor in self.graph.neighbors(node) {
            if let Some(cycle) = self.dfs_find_cycle(neighbor, visited, path) {
                return Some(cycle);
            }
        }

        path.pop();
        visited.insert(node, false);
        None
    }

    /// Get topologically sorted task names for the whole graph
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        Ok(self
            .sorted_indices()?
            .iter()
            .map(|&idx| self.graph[idx].clone())
            .collect())
    }

    /// Execution order for one task: its transitive dependency closure in
    /// topological order, ending with the task itself.
    pub fn execution_order_for(&self, task_name: &str) -> Result<Vec<String>> {
        let target = *self
            .task_indices
            .get(task_name)
            .ok_or_else(|| AssetFlowError::UnknownTask(task_name.to_string()))?;

        // Collect the target and everything it (transitively) depends on
        let mut needed = HashSet::new();
        let mut stack = vec![target];
        while let Some(node) = stack.pop() {
            if needed.insert(node) {
                for parent in self
                    .graph
                    .neighbors_directed(node, petgraph::Direction::Incoming)
                {
                    stack.push(parent);
                }
            }
        }

        Ok(self
            .sorted_indices()?
            .into_iter()
            .filter(|idx| needed.contains(idx))
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Whether a task exists in the graph
    pub fn contains(&self, task_name: &str) -> bool {
        self.task_indices.contains_key(task_name)
    }

    fn sorted_indices(&self) -> Result<Vec<NodeIndex>> {
        toposort(&self.graph, None).map_err(|_| {
            AssetFlowError::CycleDetected("Cycle detected during topological sort".to_string())
        })
    }
}
