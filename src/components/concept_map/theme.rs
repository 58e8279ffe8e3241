use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

use super::host::{HostContext, SafeAreaInsets};

const FONT_STYLE_ID: &str = "concept-map-host-fonts";

/// Apply host theme hints to the document. Failures are logged and ignored.
pub fn apply_host_context(ctx: &HostContext) {
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		return;
	};
	if let Err(err) = apply(&document, ctx) {
		debug!("failed to apply host context: {err:?}");
	}
}

fn apply(document: &Document, ctx: &HostContext) -> Result<(), JsValue> {
	if let Some(root) = document.document_element() {
		if let Some(theme) = &ctx.theme {
			root.set_attribute("data-theme", theme)?;
		}
		if let Some(root) = root.dyn_ref::<HtmlElement>() {
			let style = root.style();
			for (name, value) in style_variables(ctx) {
				style.set_property(name, value)?;
			}
		}
	}

	if let Some(fonts) = host_fonts(ctx) {
		let element = match document.get_element_by_id(FONT_STYLE_ID) {
			Some(element) => element,
			None => {
				let element = document.create_element("style")?;
				element.set_id(FONT_STYLE_ID);
				if let Some(head) = document.head() {
					head.append_child(&element)?;
				}
				element
			}
		};
		element.set_text_content(Some(fonts));
	}

	if let (Some(insets), Some(body)) = (ctx.safe_area_insets, document.body()) {
		body.style().set_property("padding", &padding(insets))?;
	}
	Ok(())
}

/// Custom properties only; anything else in the map is ignored.
pub fn style_variables(ctx: &HostContext) -> Vec<(&str, &str)> {
	ctx.styles
		.iter()
		.flat_map(|styles| styles.variables.iter())
		.filter(|(name, _)| name.starts_with("--"))
		.filter_map(|(name, value)| Some((name.as_str(), value.as_deref()?)))
		.collect()
}

fn host_fonts(ctx: &HostContext) -> Option<&str> {
	ctx.styles.as_ref()?.css.as_ref()?.fonts.as_deref()
}

pub fn padding(insets: SafeAreaInsets) -> String {
	format!(
		"{}px {}px {}px {}px",
		insets.top, insets.right, insets.bottom, insets.left
	)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn only_set_custom_properties_are_applied() {
		let ctx: HostContext = serde_json::from_str(
			r##"{"styles": {"variables": {
				"--color-text-primary": "#eee",
				"--unset": null,
				"background": "url(javascript:alert(1))"
			}}}"##,
		)
		.unwrap();
		assert_eq!(style_variables(&ctx), vec![("--color-text-primary", "#eee")]);
	}

	#[test]
	fn insets_become_body_padding() {
		let insets = SafeAreaInsets {
			top: 1.0,
			right: 2.5,
			bottom: 0.0,
			left: 4.0,
		};
		assert_eq!(padding(insets), "1px 2.5px 0px 4px");
	}

	#[test]
	fn fonts_are_optional() {
		assert_eq!(host_fonts(&HostContext::default()), None);
	}
}
