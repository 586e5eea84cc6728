pub mod libs;

pub use crate::libs::io::{reader, writer};
pub use crate::libs::maf::{MafAli, MafComp, MafReader, MafWriter, GAP};
pub use crate::libs::pinch::{issue_pinches, Pinch, PinchOp, PinchRecorder};
pub use crate::libs::planner::{comparison_order, plan_block, RefSegment, Region};
pub use crate::libs::registry::SeqPool;
pub use crate::libs::thread_set::ThreadSet;
