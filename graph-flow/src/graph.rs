use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    context::Context,
    error::{GraphError, Result},
    session::Session,
    task::{NextAction, Task, TaskResult},
};

/// Type alias for edge condition functions
pub type EdgeCondition = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Picks a route label from the context; `None` means no label could be derived
pub type RouteSelector = Arc<dyn Fn(&Context) -> Option<String> + Send + Sync>;

/// Edge between tasks in the graph
#[derive(Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub condition: Option<EdgeCondition>,
}

/// Label-keyed dispatch out of a single task
#[derive(Clone)]
pub struct RouteTable {
    pub from: String,
    selector: RouteSelector,
    routes: HashMap<String, String>,
}

impl RouteTable {
    fn resolve(&self, context: &Context) -> Option<&String> {
        let label = (self.selector)(context)?;
        self.routes.get(&label)
    }
}

/// A graph of tasks that can be executed
pub struct Graph {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    edges: Vec<Edge>,
    route_tables: Vec<RouteTable>,
    start_task_id: String,
}

impl Graph {
    /// Execute the session's current task and keep going while tasks ask for
    /// `ContinueAndExecute`. The session is left pointing at the last task run,
    /// or at the next one when a task returns `Continue`.
    pub async fn execute_session(&self, session: &mut Session) -> Result<ExecutionResult> {
        loop {
            let result = self
                .execute_single_task(&session.current_task_id, session.context.clone())
                .await?;
            session.status_message = result.status_message.clone();

            match result.next_action {
                NextAction::ContinueAndExecute => {
                    let next = self
                        .find_next_task(&result.task_id, &session.context)
                        .ok_or_else(|| GraphError::NoRoute(result.task_id.clone()))?;
                    debug!(from = %result.task_id, to = %next, "continuing execution");
                    session.current_task_id = next;
                }
                NextAction::Continue => {
                    if let Some(next) = self.find_next_task(&result.task_id, &session.context) {
                        session.current_task_id = next;
                    }
                    return Ok(ExecutionResult {
                        response: result.response,
                        status: ExecutionStatus::Paused,
                        task_id: result.task_id,
                    });
                }
                NextAction::End => {
                    info!(graph = %self.id, task_id = %result.task_id, "graph execution completed");
                    return Ok(ExecutionResult {
                        response: result.response,
                        status: ExecutionStatus::Completed,
                        task_id: result.task_id,
                    });
                }
            }
        }
    }

    /// Execute a single task without following any edge
    async fn execute_single_task(&self, task_id: &str, context: Context) -> Result<TaskResult> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| GraphError::TaskNotFound(task_id.to_string()))?;

        let mut result = task.run(context).await?;
        result.task_id = task_id.to_string();
        Ok(result)
    }

    /// Find the next task: route tables first, then edges in insertion order
    pub fn find_next_task(&self, current_task_id: &str, context: &Context) -> Option<String> {
        for table in self.route_tables.iter().filter(|t| t.from == current_task_id) {
            if let Some(to) = table.resolve(context) {
                return Some(to.clone());
            }
        }

        self.edges
            .iter()
            .filter(|edge| edge.from == current_task_id)
            .find(|edge| edge.condition.as_ref().is_none_or(|condition| condition(context)))
            .map(|edge| edge.to.clone())
    }

    pub fn start_task_id(&self) -> &str {
        &self.start_task_id
    }

    pub fn get_task(&self, task_id: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(task_id).cloned()
    }

    /// Start a fresh session positioned at the entry task
    pub fn start_session(&self, id: impl Into<String>) -> Session {
        let mut session = Session::new_from_task(id.into(), &self.start_task_id);
        session.graph_id = self.id.clone();
        session
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    task_order: Vec<String>,
    edges: Vec<Edge>,
    route_tables: Vec<RouteTable>,
    start_task_id: Option<String>,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: HashMap::new(),
            task_order: Vec::new(),
            edges: Vec::new(),
            route_tables: Vec::new(),
            start_task_id: None,
        }
    }

    /// Add a task; the first task added is the default entry point
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let task_id = task.id().to_string();
        if !self.tasks.contains_key(&task_id) {
            self.task_order.push(task_id.clone());
        }
        self.tasks.insert(task_id, task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: None,
        });
        self
    }

    pub fn add_conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        condition: F,
    ) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: Some(Arc::new(condition)),
        });
        self
    }

    /// Route out of `from` by label: `selector` derives a label from the context
    /// and `routes` maps each label to a target task.
    pub fn add_routed_edges<F, I, L, T>(mut self, from: impl Into<String>, selector: F, routes: I) -> Self
    where
        F: Fn(&Context) -> Option<String> + Send + Sync + 'static,
        I: IntoIterator<Item = (L, T)>,
        L: Into<String>,
        T: Into<String>,
    {
        self.route_tables.push(RouteTable {
            from: from.into(),
            selector: Arc::new(selector),
            routes: routes
                .into_iter()
                .map(|(label, to)| (label.into(), to.into()))
                .collect(),
        });
        self
    }

    pub fn set_start_task(mut self, task_id: impl Into<String>) -> Self {
        self.start_task_id = Some(task_id.into());
        self
    }

    /// Validate the wiring and produce the graph
    pub fn build(self) -> Result<Graph> {
        let start_task_id = self
            .start_task_id
            .or_else(|| self.task_order.first().cloned())
            .ok_or_else(|| GraphError::InvalidGraph(format!("graph '{}' has no tasks", self.id)))?;

        let known = |id: &str| self.tasks.contains_key(id);
        if !known(&start_task_id) {
            return Err(GraphError::InvalidGraph(format!(
                "start task '{}' is not part of graph '{}'",
                start_task_id, self.id
            )));
        }

        let endpoints = self
            .edges
            .iter()
            .flat_map(|edge| [edge.from.as_str(), edge.to.as_str()])
            .chain(self.route_tables.iter().flat_map(|table| {
                std::iter::once(table.from.as_str()).chain(table.routes.values().map(String::as_str))
            }));
        for id in endpoints {
            if !known(id) {
                return Err(GraphError::InvalidGraph(format!(
                    "edge references unknown task '{}'",
                    id
                )));
            }
        }

        Ok(Graph {
            id: self.id,
            tasks: self.tasks,
            edges: self.edges,
            route_tables: self.route_tables,
            start_task_id,
        })
    }
}

/// Status of graph execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: Option<String>,
    pub status: ExecutionStatus,
    /// Id of the last task that ran
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Stopped after a `Continue`; calling again resumes at the next task
    Paused,
    /// A task ended the execution
    Completed,
}
