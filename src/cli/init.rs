use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path, DB_FILE};

pub fn run(data_dir: Option<String>, rules_file: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(file) = rules_file {
        settings.rules_file = Some(shellexpand_path(&file));
    }

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    save_settings(&settings)?;

    let db_path = resolved.join(DB_FILE);
    let existed = db_path.exists();
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    if existed {
        println!("Using existing database at {}", db_path.display());
    } else {
        println!("Initialized pennywise at {}", resolved.display());
    }
    if let Some(rules) = &settings.rules_file {
        println!("Rules file: {rules}");
    }
    Ok(())
}
