//! Demo catalog loaded into an empty database.

use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use tokio::task;
use tracing::info;

use super::repositories::user::hash_password;
use crate::config::SecurityConfig;
use crate::entities::{artifacts, users, wizards};

const IMAGE_URL: &str = "ImageUrl";

struct SeedArtifact {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    /// Index into `WIZARDS`
    owner: Option<usize>,
}

const WIZARDS: [&str; 3] = ["Albus Dumbledore", "Harry Potter", "Neville Longbottom"];

const ARTIFACTS: [SeedArtifact; 6] = [
    SeedArtifact {
        id: "125080601744904191",
        name: "Deluminator",
        description: "A Deluminator is a device invented by Albus Dumbledore that resembles a cigarette lighter. It is used to remove or absorb (as well as return) the light from any light source to provide cover to the user.",
        owner: Some(0),
    },
    SeedArtifact {
        id: "125080601744904192",
        name: "Invisibility Cloak",
        description: "An invisibility cloak is used to make the wearer invisible.",
        owner: Some(1),
    },
    SeedArtifact {
        id: "125080601744904193",
        name: "Elder Wand",
        description: "The Elder Wand, known throughout history as the Deathstick or the Wand of Destiny, is an extremely powerful wand made of elder wood with a core of Thestral tail hair.",
        owner: Some(0),
    },
    SeedArtifact {
        id: "125080601744904194",
        name: "The Marauder's Map",
        description: "A magical map of Hogwarts created by Remus Lupin, Peter Pettigrew, Sirius Black, and James Potter while they were students at Hogwarts.",
        owner: Some(1),
    },
    SeedArtifact {
        id: "125080601744904195",
        name: "The Sword Of Gryffindor",
        description: "A goblin-made sword adorned with large rubies on the pommel. It was once owned by Godric Gryffindor, one of the medieval founders of Hogwarts.",
        owner: Some(2),
    },
    SeedArtifact {
        id: "125080601744904196",
        name: "Resurrection Stone",
        description: "The Resurrection Stone allows the holder to bring back deceased loved ones, in a semi-physical form, and communicate with them.",
        owner: None,
    },
];

/// (username, password, roles, enabled)
const USERS: [(&str, &str, &str, bool); 3] = [
    ("john", "123456", "admin user", true),
    ("eric", "654321", "user", true),
    ("tom", "qwerty", "user", false),
];

/// Inserts the demo wizards, artifacts and users in one transaction.
pub async fn seed_demo_data(conn: &DatabaseConnection, security: &SecurityConfig) -> Result<()> {
    let config = security.clone();
    let hashes = task::spawn_blocking(move || {
        USERS
            .iter()
            .map(|(_, password, _, _)| hash_password(password, Some(&config)))
            .collect::<Result<Vec<_>>>()
    })
    .await
    .context("Password hashing task panicked")??;

    let txn = conn.begin().await?;

    let mut wizard_ids = Vec::with_capacity(WIZARDS.len());
    for name in WIZARDS {
        let wizard = wizards::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to seed wizard")?;
        wizard_ids.push(wizard.id);
    }

    for artifact in &ARTIFACTS {
        artifacts::ActiveModel {
            id: Set(artifact.id.to_string()),
            name: Set(artifact.name.to_string()),
            description: Set(artifact.description.to_string()),
            image_url: Set(IMAGE_URL.to_string()),
            owner_id: Set(artifact.owner.and_then(|i| wizard_ids.get(i).copied())),
        }
        .insert(&txn)
        .await
        .context("Failed to seed artifact")?;
    }

    let now = chrono::Utc::now().to_rfc3339();
    for ((username, _, roles, enabled), password_hash) in USERS.iter().zip(hashes) {
        users::ActiveModel {
            username: Set((*username).to_string()),
            password_hash: Set(password_hash),
            enabled: Set(*enabled),
            roles: Set((*roles).to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to seed user")?;
    }

    txn.commit().await?;

    info!(
        wizards = WIZARDS.len(),
        artifacts = ARTIFACTS.len(),
        users = USERS.len(),
        "Seeded demo data"
    );
    Ok(())
}
