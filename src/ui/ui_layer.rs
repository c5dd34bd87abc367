// The ui module is the presentation layer: the widget model, the two views
// and the terminal loop that drives them.

#[path = "rich_text.rs"]
pub mod rich_text;

#[path = "notifier.rs"]
pub mod notifier;

#[path = "editor_view.rs"]
pub mod editor_view;

#[path = "root_view.rs"]
pub mod root_view;

#[path = "terminal.rs"]
pub mod terminal;
