pub mod config;
pub mod dom;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod form;
pub mod harness;
pub mod page;
pub mod scenario;
pub mod selector;
pub mod visits;
pub mod wait;
pub mod ward;

pub use config::HarnessConfig;
pub use driver::Driver;
pub use error::{FailureKind, HarnessError, HarnessResult};
pub use harness::Harness;
pub use page::{ElementHandle, Page};
pub use scenario::{Runner, Scenario, ScenarioReport, SuiteReport};
pub use selector::Locator;
pub use wait::WaitPolicy;
pub use ward::WardApp;

/// Parse an HTML string and return the nodes matching `selector`, in
/// document order.
pub fn query(html: &str, selector: &str) -> HarnessResult<(dom::Document, Vec<dom::NodeId>)> {
    let document = dom::parse_html(html)?;
    let locator = Locator::css(selector)?;
    let nodes = selector::query(&document, locator.selectors());
    Ok((document, nodes))
}
