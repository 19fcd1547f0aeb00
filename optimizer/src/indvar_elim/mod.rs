mod impls;
pub mod scev;

// Rewrites derived induction variables of innermost loops as affine
// functions of the canonical loop counter, then erases the definitions
// nothing reads anymore. The update chains of secondary counters become
// dead this way, which is the point: one add per iteration instead of one
// per derived variable.
#[derive(Default)]
pub struct DerivedIvElim {}
