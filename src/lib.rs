pub mod config;
pub mod core;
pub mod utils;

pub use crate::core::error::{WorkbenchError, WorkbenchResult};
pub use crate::core::launch::{LaunchArgs, LaunchArgsBuilder, LaunchOptions};
pub use crate::core::port::{PortAllocator, PortProbe, TcpPortProbe};
pub use crate::core::probe::{AvailabilityProbe, FixedTokenScraper, StartTimeScraper};
pub use crate::core::request::{GpuKind, RequestBuilder, ResourceExpression, ResourceRequest};
pub use crate::core::session::{Session, SessionReport, SessionState};
