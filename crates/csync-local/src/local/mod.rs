// ── csync-local / local module ───────────────────────────────────────────────
//
// LOCAL backend: a base directory on this machine behind the same
// engine/session interface as the remote backends. Sessions hold no
// transport; directory copies go through `walkdir`.

pub mod copy;
pub mod engine;
