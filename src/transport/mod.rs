/// Filesystem transport: shard reading and text logs.
pub mod fs;
