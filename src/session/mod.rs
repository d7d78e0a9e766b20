// Automation session boundary — how the pipeline sees the live page.

pub mod traits;
pub mod webdriver;

pub use traits::{ElementId, Locator, PageSession};
pub use webdriver::WebDriverSession;
