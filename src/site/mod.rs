pub mod context;
pub mod store;

pub use context::{ActiveSite, SiteContext, SiteContextManager};
pub use store::{JsonSiteStore, Record, SiteDirectory, SiteStore, SiteSummary};
