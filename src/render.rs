use crate::{LoadStatus, PreviewState};
use htmlescape::{encode_attribute, encode_minimal};
use std::fmt::Write;

pub const LINK_LABEL: &str = "Go to Website";

/// Scoped style sheet. Design tokens are read from custom properties with
/// literal fallbacks so the card renders without a theme.
pub const STYLES: &str = r#":host {
  display: block;
  color: var(--ddd-theme-primary, #001e44);
  background-color: var(--ddd-theme-accent, #ffffff);
  font-family: var(--ddd-font-navigation, "Roboto Condensed", sans-serif);
}
.card {
  width: 350px;
  border-radius: var(--ddd-radius-sm, 4px);
  margin: 20px auto;
  box-shadow: var(--ddd-boxShadow-sm, rgba(0, 3, 33, 0.063) 0px 4px 8px 0px);
  text-align: center;
  padding: var(--ddd-spacing-4, 16px);
  background-color: var(--ddd-theme-default-coalyGray, #262626);
}
.card.fancy {
  background-color: var(--ddd-theme-default-beaverBlue, #1e407c);
}
.card.loading {
  opacity: 0.6;
}
.title {
  font-size: var(--ddd-font-size-s, 24px);
  font-weight: var(--ddd-font-weight-bold, 700);
  margin-bottom: var(--ddd-spacing-2, 8px);
  margin-top: var(--ddd-spacing-2, 8px);
  color: var(--ddd-theme-default-white, #ffffff);
}
.card img {
  max-width: 200px;
  max-height: 150px;
  height: auto;
  border-radius: var(--ddd-radius-sm, 4px);
  border: var(--ddd-border-sm, 1px solid);
  border-color: var(--ddd-border-color-white, #ffffff);
  margin-top: var(--ddd-spacing-2, 8px);
  margin-bottom: var(--ddd-spacing-2, 8px);
}
button {
  background-color: var(--ddd-theme-default-white, #ffffff);
  color: var(--ddd-theme-default-coalyGray, #262626);
  margin-top: var(--ddd-spacing-2, 8px);
  margin-bottom: var(--ddd-spacing-2, 8px);
  padding: var(--ddd-spacing-2, 8px);
  border: var(--ddd-border-sm, 1px solid);
  border-radius: var(--ddd-radius-sm, 4px);
  cursor: pointer;
}
button:hover {
  background-color: var(--ddd-theme-default-coalyGray, #262626);
  color: var(--ddd-theme-default-white, #ffffff);
  transition: 0.4s;
}
.description {
  margin-top: var(--ddd-spacing-2, 8px);
  margin-bottom: var(--ddd-spacing-2, 8px);
  font-size: var(--ddd-font-size-xs, 16px);
  color: var(--ddd-theme-default-white, #ffffff);
  height: 70px;
  overflow: auto;
}
details {
  border-radius: var(--ddd-radius-sm, 4px);
  border: var(--ddd-border-sm, 1px solid);
  border-color: var(--ddd-border-color-white, #ffffff);
  cursor: pointer;
}
details summary {
  padding: var(--ddd-spacing-2, 8px);
  font-size: var(--ddd-font-size-xs, 16px);
}
.wrapper {
  margin: var(--ddd-spacing-2, 8px);
  padding: var(--ddd-spacing-4, 16px);
}
h3 span {
  font-size: var(--link-preview-label-font-size, var(--ddd-font-size-s, 24px));
}
"#;

/// Renders the card markup for `state`. Pure: the same state always yields
/// the same string.
pub fn render(state: &PreviewState) -> String {
    let mut classes = String::from("card");
    if state.fancy {
        classes.push_str(" fancy");
    }
    let busy = state.status == LoadStatus::Loading;
    if busy {
        classes.push_str(" loading");
    }

    let title_text = encode_minimal(&state.title);
    let title_attr = encode_attribute(&state.title);
    let image_attr = encode_attribute(&state.image);
    let description_text = encode_minimal(&state.description);
    let url_attr = encode_attribute(&state.url);

    let mut html = String::with_capacity(
        256 + title_text.len() * 2 + image_attr.len() + description_text.len() + url_attr.len(),
    );

    // Writing into a String cannot fail.
    let _ = write!(html, "<div class=\"{classes}\"");
    if busy {
        html.push_str(" aria-busy=\"true\"");
    }
    html.push_str(">\n");
    let _ = writeln!(html, "  <h1 class=\"title\">{title_text}</h1>");
    let _ = writeln!(html, "  <img src=\"{image_attr}\" alt=\"{title_attr}\" />");
    let _ = writeln!(
        html,
        "  <div class=\"description\">\n    <slot>{description_text}</slot>\n  </div>"
    );
    let _ = writeln!(
        html,
        "  <a href=\"{url_attr}\" target=\"_blank\" rel=\"noopener noreferrer\">"
    );
    let _ = writeln!(
        html,
        "    <button class=\"btn\"><em>{LINK_LABEL}</em></button>"
    );
    html.push_str("  </a>\n</div>\n");
    html
}

/// Style sheet and card markup together, for embedding outside a shadow root.
pub fn render_document(state: &PreviewState) -> String {
    format!("<style>\n{STYLES}</style>\n{}", render(state))
}
