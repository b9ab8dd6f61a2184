use crate::args::{Folder, OpenArgs};
use crate::commands::{App, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Result};
use anyhow::Context;
use std::path::PathBuf;

/// Opens the invoices folder or the folder holding the workbook in the file browser. The invoices
/// folder is created first if it does not exist yet.
pub async fn open(app: &App, args: &OpenArgs) -> Result<Out<PathBuf>> {
    let folder = match args.folder() {
        Folder::Invoices => {
            let dir = app.config().invoices_dir();
            utils::make_dir(&dir).await.pub_result(ErrorType::Io)?;
            dir
        }
        Folder::Workbook => app.config().workbook_dir(),
    };
    app.desktop()
        .open_folder(&folder)
        .await
        .with_context(|| format!("Unable to open the {} folder", args.folder()))
        .pub_result(ErrorType::Io)?;
    Ok(Out::new(format!("Opened {}", folder.display()), folder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_open_folders() {
        let env = TestEnv::new().await;
        let app = env.app();

        open(&app, &OpenArgs::new(Folder::Invoices)).await.unwrap();
        let out = open(&app, &OpenArgs::new(Folder::Workbook)).await.unwrap();

        let config = env.config();
        assert_eq!(out.structure().unwrap(), &config.root().join("tableau"));
        assert_eq!(
            env.opened(),
            vec![config.invoices_dir(), config.root().join("tableau")]
        );
    }
}
