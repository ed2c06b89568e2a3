//! Session Commands

use anyhow::Result;
use cloudpanel_client::forms::LoginForm;
use cloudpanel_client::{AuthBanner, Panel};
use serde::Serialize;

use crate::output::{print_error, print_info, print_item, OutputFormat, TableDisplay};

/// Signed-in user display wrapper for serialization
#[derive(Serialize)]
pub struct WhoamiDisplay {
    pub signed_in: bool,
    pub name: String,
    pub email: String,
    pub banner: AuthBanner,
}

impl TableDisplay for WhoamiDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Signed In", "Name", "Email"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            if self.signed_in { "yes" } else { "no" }.to_string(),
            self.name.clone(),
            self.email.clone(),
        ]
    }
}

fn whoami_display(panel: &Panel) -> WhoamiDisplay {
    let user = panel.session().current_user();
    WhoamiDisplay {
        signed_in: user.is_some(),
        name: user.as_ref().map(|u| u.name.clone()).unwrap_or_default(),
        email: user.as_ref().map(|u| u.email.clone()).unwrap_or_default(),
        banner: panel.auth().banner(),
    }
}

pub async fn login(panel: &Panel, username: String, password: String) -> Result<()> {
    match (LoginForm { username, password }).parse() {
        Ok(credentials) => {
            let _ = panel.auth().login(&credentials).await;
        }
        Err(e) => print_error(&e.to_string()),
    }
    Ok(())
}

pub async fn logout(panel: &Panel) -> Result<()> {
    if !panel.session().is_authenticated() {
        print_info("Not signed in");
        return Ok(());
    }
    panel.auth().logout().await?;
    Ok(())
}

pub fn whoami(panel: &Panel, format: OutputFormat) -> Result<()> {
    print_item(&whoami_display(panel), format);
    Ok(())
}

/// Check the stored session with the backend, then show who is signed in
pub async fn verify(panel: &Panel, format: OutputFormat) -> Result<()> {
    panel.auth().init().await;
    print_item(&whoami_display(panel), format);
    Ok(())
}
