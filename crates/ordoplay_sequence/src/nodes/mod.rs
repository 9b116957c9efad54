// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node library.

pub mod control;
pub mod log;
pub mod nested;
pub mod parameter;
pub mod wait;

pub use control::{ParallelNext, SkipIfParameter, SkipNodes, StopSequence};
pub use log::{LogLevel, LogMessage};
pub use nested::{LoopCount, NestedSequence};
pub use parameter::SetParameter;
pub use wait::{Wait, WaitFrames, WaitUntilParameter};
