//! Eventually-available chart artifacts.
//!
//! Charts referenced by a freshly computed profile may not exist yet when the
//! profile arrives. Each one gets its own loader that probes the URL with
//! bounded linear backoff until it decodes, gives up, or is cancelled:
//!
//! - **State** (`state`): `ArtifactLoadState` and its pure transitions
//! - **Probe** (`probe`): the existence-check trait and the HTTP image probe
//! - **Loader** (`loader`): the retry loop, spawned handles, cancellation
//! - **Charts** (`charts`): one loader per chart of a profile

mod charts;
mod loader;
mod probe;
mod state;

pub use charts::{ChartSet, ChartSlot};
pub use loader::{ArtifactError, ArtifactHandle, ArtifactLoader};
pub use probe::{ArtifactProbe, HttpImageProbe, ProbeError, decode_dimensions};
pub use state::{ArtifactLoadState, ArtifactStatus, ArtifactStep};
