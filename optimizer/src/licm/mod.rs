mod impls;

// Moves loop-invariant register-to-register instructions into the loop
// preheader. Memory and calls are never touched; invariance is established
// by an explicit fixed point over the written temps.
#[derive(Default)]
pub struct SimpleLicm {}
