/// Interactive confirmation of a destructive action
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Proof that the user confirmed a deletion. Only `Confirmed::ask` makes one,
/// so a delete intent cannot be built without asking first.
#[derive(Debug)]
pub struct Confirmed(());

impl Confirmed {
    pub fn ask<C: Confirm + ?Sized>(confirm: &mut C, prompt: &str) -> Option<Confirmed> {
        match confirm.confirm(prompt) {
            true => Some(Confirmed(())),
            false => {
                tracing::debug!(prompt, "confirmation declined");
                None
            }
        }
    }
}
