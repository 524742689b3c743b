use {
    crate::{
        backend::MemoryBackend, config::Config, email::Email, error::Error, store::GuestStore,
    },
    std::sync::Arc,
    tinytemplate::TinyTemplate,
};

static ERROR: &str = include_str!("../templates/error.html");
static INDEX: &str = include_str!("../templates/index.html");
static INVITE: &str = include_str!("../templates/invite.html");
static CONFIRM: &str = include_str!("../templates/confirm.html");
static ADMIN: &str = include_str!("../templates/admin.html");

/// Shared by every worker; built once at startup
pub struct AppState {
    pub store: GuestStore,
    pub tt: TinyTemplate<'static>,
    pub email: Option<Email>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GuestStore::new(Arc::new(MemoryBackend::new())), None)
    }
}

impl AppState {
    pub fn new(store: GuestStore, email: Option<Email>) -> Self {
        Self {
            store,
            tt: templates(),
            email,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let store = GuestStore::new(config.open_backend()?);
        Ok(Self::new(store, config.email()))
    }

    pub fn render(&self, template: &str, ctx: &serde_json::Value) -> Result<String, Error> {
        self.tt.render(template, ctx).map_err(Error::from)
    }
}

fn templates() -> TinyTemplate<'static> {
    let mut tt = TinyTemplate::new();
    for (name, text) in [
        ("index.html", INDEX),
        ("invite.html", INVITE),
        ("confirm.html", CONFIRM),
        ("admin.html", ADMIN),
        ("error.html", ERROR),
    ] {
        if let Err(error) = tt.add_template(name, text) {
            panic!("template {} does not parse: {}", name, error);
        }
    }
    tt
}
