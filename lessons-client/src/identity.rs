use crate::api::User;

/// Who is acting, as provided by the authentication layer
pub trait Identity {
    fn current_user_email(&self) -> Option<&str>;

    fn is_logged_in(&self) -> bool {
        self.current_user_email().is_some()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Anonymous;

impl Identity for Anonymous {
    fn current_user_email(&self) -> Option<&str> {
        None
    }
}

impl Identity for User {
    fn current_user_email(&self) -> Option<&str> {
        Some(&self.email)
    }
}

impl<I: Identity> Identity for Option<I> {
    fn current_user_email(&self) -> Option<&str> {
        self.as_ref().and_then(|i| i.current_user_email())
    }
}

impl<I: Identity + ?Sized> Identity for &I {
    fn current_user_email(&self) -> Option<&str> {
        (**self).current_user_email()
    }
}
