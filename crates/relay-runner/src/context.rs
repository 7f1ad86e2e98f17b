use relay_core::{Content, InvocationContext, ReadonlyContext};

pub struct DefaultInvocationContext {
    invocation_id: String,
    app_name: String,
    user_content: Option<Content>,
    max_turns: Option<u32>,
}

impl DefaultInvocationContext {
    pub fn new(
        invocation_id: String,
        app_name: String,
        user_content: Option<Content>,
        max_turns: Option<u32>,
    ) -> Self {
        Self {
            invocation_id,
            app_name,
            user_content,
            max_turns,
        }
    }
}

impl InvocationContext for DefaultInvocationContext {
    fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    fn user_content(&self) -> Option<&Content> {
        self.user_content.as_ref()
    }

    fn max_turns(&self) -> Option<u32> {
        self.max_turns
    }
}

impl ReadonlyContext for DefaultInvocationContext {
    fn app_name(&self) -> &str {
        &self.app_name
    }
}
