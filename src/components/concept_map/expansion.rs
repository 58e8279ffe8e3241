use std::rc::Rc;

use futures::channel::mpsc::{self, Receiver, Sender};
use futures::{Stream, StreamExt};
use log::debug;
use serde::Serialize;

use super::config::ExpansionConfig;
use super::error::Result;
use super::host::{ToolCall, ToolHost, parse_context_result};
use super::types::ConceptContextResult;

/// Arguments of the retrieval tool for one node expansion.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandRequest {
	pub concept_name: String,
	pub depth: u32,
	pub max_entities: u32,
	pub include_content: bool,
}

impl ExpandRequest {
	pub fn new(concept_name: impl Into<String>, config: &ExpansionConfig) -> Self {
		Self {
			concept_name: concept_name.into(),
			depth: config.bounded_depth(),
			max_entities: config.bounded_max_entities(),
			include_content: config.include_content,
		}
	}
}

/// Producer half of the bounded node-click queue.
pub struct ClickSender(Sender<String>);

impl ClickSender {
	/// Never blocks; a click is dropped when the queue is full.
	pub fn send(&mut self, concept_name: String) -> bool {
		match self.0.try_send(concept_name) {
			Ok(()) => true,
			Err(err) => {
				debug!("dropping click on '{}': queue full or closed", err.into_inner());
				false
			}
		}
	}
}

pub fn click_channel(capacity: usize) -> (ClickSender, Receiver<String>) {
	let (tx, rx) = mpsc::channel(capacity);
	(ClickSender(tx), rx)
}

/// Turns node clicks into retrieval calls and hands successful results back.
pub struct ExpansionController {
	host: Rc<dyn ToolHost>,
	config: ExpansionConfig,
}

impl ExpansionController {
	pub fn new(host: Rc<dyn ToolHost>, config: ExpansionConfig) -> Self {
		Self { host, config }
	}

	pub async fn expand(&self, concept_name: String) -> Result<ConceptContextResult> {
		let request = ExpandRequest::new(concept_name, &self.config);
		let call = ToolCall {
			name: self.config.tool_name.clone(),
			arguments: serde_json::to_value(&request)?,
		};
		let result = self.host.call_tool(call).await?;
		parse_context_result(&result)
	}

	/// Serve clicks until the stream ends. Expansions run concurrently and
	/// results are delivered in arrival order; failures are dropped.
	pub async fn run<S, F>(self, clicks: S, on_result: F)
	where
		S: Stream<Item = String>,
		F: Fn(ConceptContextResult),
	{
		let (this, on_result) = (&self, &on_result);
		clicks
			.for_each_concurrent(None, |concept_name| async move {
				match this.expand(concept_name.clone()).await {
					Ok(result) => on_result(result),
					Err(err) => debug!("expansion of '{concept_name}' failed: {err}"),
				}
			})
			.await;
	}
}
