use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::future::LocalBoxFuture;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::error::{ConceptMapError, Result};
use super::types::ConceptContextResult;

/// Outbound server tool invocation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolCall {
	pub name: String,
	pub arguments: serde_json::Value,
}

/// Reply to a tool call, or a tool result pushed by the host.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
	#[serde(default)]
	pub content: Vec<ContentBlock>,
	#[serde(default)]
	pub is_error: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
	Text { text: String },
	#[serde(other)]
	Other,
}

impl ToolResult {
	pub fn first_text(&self) -> Option<&str> {
		self.content.iter().find_map(|block| match block {
			ContentBlock::Text { text } => Some(text.as_str()),
			ContentBlock::Other => None,
		})
	}
}

/// Theme and layout hints from the host shell.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
	#[serde(default)]
	pub theme: Option<String>,
	#[serde(default)]
	pub styles: Option<HostStyles>,
	#[serde(default)]
	pub safe_area_insets: Option<SafeAreaInsets>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HostStyles {
	#[serde(default)]
	pub variables: BTreeMap<String, Option<String>>,
	#[serde(default)]
	pub css: Option<HostCss>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HostCss {
	#[serde(default)]
	pub fonts: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct SafeAreaInsets {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
	ToolResult(ToolResult),
	ContextChanged(HostContext),
}

/// The one outbound capability the explorer needs from its host.
pub trait ToolHost {
	fn call_tool(&self, call: ToolCall) -> LocalBoxFuture<'static, Result<ToolResult>>;
}

/// Tool access plus the stream of host notifications, handed to the view once.
#[derive(Clone)]
pub struct HostBridge {
	tools: Rc<dyn ToolHost>,
	events: Rc<RefCell<Option<UnboundedReceiver<HostEvent>>>>,
}

impl HostBridge {
	pub fn new(tools: Rc<dyn ToolHost>, events: UnboundedReceiver<HostEvent>) -> Self {
		Self {
			tools,
			events: Rc::new(RefCell::new(Some(events))),
		}
	}

	pub fn tools(&self) -> Rc<dyn ToolHost> {
		self.tools.clone()
	}

	/// The event stream can only be consumed once.
	pub fn take_events(&self) -> Option<UnboundedReceiver<HostEvent>> {
		self.events.borrow_mut().take()
	}
}

/// Extract and validate a concept context result from a tool result.
pub fn parse_context_result(result: &ToolResult) -> Result<ConceptContextResult> {
	if result.is_error == Some(true) {
		let message = result.first_text().unwrap_or("unknown error");
		return Err(ConceptMapError::ToolError(message.to_owned()));
	}
	let text = result
		.first_text()
		.ok_or(ConceptMapError::MissingTextContent)?;
	parse_context_text(text)
}

pub fn parse_context_text(text: &str) -> Result<ConceptContextResult> {
	let result: ConceptContextResult = serde_json::from_str(text)?;
	if result.concept_name.trim().is_empty() {
		return Err(ConceptMapError::InvalidResult("empty concept name".into()));
	}
	for related in &result.direct_relations {
		if related.name.trim().is_empty() {
			return Err(ConceptMapError::InvalidResult(
				"related concept without a name".into(),
			));
		}
		if !related.weighted_score.is_finite() || related.weighted_score < 0.0 {
			return Err(ConceptMapError::InvalidResult(format!(
				"score {} for '{}'",
				related.weighted_score, related.name
			)));
		}
	}
	Ok(result)
}

#[wasm_bindgen]
extern "C" {
	/// The MCP ext-apps `App` instance created by the host page.
	pub type McpApp;

	#[wasm_bindgen(method, catch, js_name = callServerTool)]
	fn call_server_tool(
		this: &McpApp,
		params: &JsValue,
	) -> std::result::Result<js_sys::Promise, JsValue>;

	#[wasm_bindgen(method, setter)]
	fn set_ontoolresult(this: &McpApp, handler: &js_sys::Function);

	#[wasm_bindgen(method, setter)]
	fn set_onhostcontextchanged(this: &McpApp, handler: &js_sys::Function);
}

/// `ToolHost` backed by the JS `App` object.
pub struct JsHost {
	app: McpApp,
	handlers: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
}

impl JsHost {
	pub fn new(app: McpApp) -> Self {
		Self {
			app,
			handlers: RefCell::new(Vec::new()),
		}
	}

	/// Route the host's notification hooks into a channel.
	pub fn subscribe(&self) -> UnboundedReceiver<HostEvent> {
		let (tx, rx) = mpsc::unbounded();

		let results = tx.clone();
		let on_result = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
			match from_js::<ToolResult>(&value) {
				Ok(result) => {
					let _ = results.unbounded_send(HostEvent::ToolResult(result));
				}
				Err(err) => debug!("ignoring unreadable tool result: {err}"),
			}
		});
		self.app
			.set_ontoolresult(on_result.as_ref().unchecked_ref());

		let on_context = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
			match from_js::<HostContext>(&value) {
				Ok(ctx) => {
					let _ = tx.unbounded_send(HostEvent::ContextChanged(ctx));
				}
				Err(err) => debug!("ignoring unreadable host context: {err}"),
			}
		});
		self.app
			.set_onhostcontextchanged(on_context.as_ref().unchecked_ref());

		self.handlers.borrow_mut().extend([on_result, on_context]);
		rx
	}
}

impl ToolHost for JsHost {
	fn call_tool(&self, call: ToolCall) -> LocalBoxFuture<'static, Result<ToolResult>> {
		let promise = to_js(&call).and_then(|params| {
			self.app
				.call_server_tool(&params)
				.map_err(|err| host_error(&err))
		});
		async move {
			let value = JsFuture::from(promise?)
				.await
				.map_err(|err| host_error(&err))?;
			from_js(&value)
		}
		.boxed_local()
	}
}

fn host_error(value: &JsValue) -> ConceptMapError {
	ConceptMapError::Host(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue> {
	let json = serde_json::to_string(value)?;
	js_sys::JSON::parse(&json).map_err(|err| host_error(&err))
}

fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T> {
	let json: String = js_sys::JSON::stringify(value)
		.map_err(|err| host_error(&err))?
		.into();
	Ok(serde_json::from_str(&json)?)
}
