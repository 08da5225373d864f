//! Interactive text menu over the users contract.
//!
//! Input and output are generic so the loop can run against stdin/stdout or
//! in-memory buffers.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::contract::{NewUser, User, UserId, UserPatch, UsersApi};

const MENU: &str = "\n=== User Service ===\n\
1) Create user\n\
2) List all users\n\
3) Get user by id\n\
4) Update user\n\
5) Delete user\n\
0) Exit\n\
Select: ";

pub struct ConsoleApp<R, W> {
    api: Arc<dyn UsersApi>,
    input: R,
    output: W,
}

impl<R, W> ConsoleApp<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(api: Arc<dyn UsersApi>, input: R, output: W) -> Self {
        Self { api, input, output }
    }

    /// Run the menu until `0` or end of input. Only I/O failures on the
    /// console itself end the loop with an error.
    pub async fn run(&mut self) -> std::io::Result<()> {
        info!("Console session started");
        loop {
            self.write(MENU).await?;
            let Some(choice) = self.read_line().await? else {
                break;
            };

            let outcome = match choice.as_str() {
                "1" => self.create_user().await,
                "2" => self.list_users().await,
                "3" => self.get_user().await,
                "4" => self.update_user().await,
                "5" => self.delete_user().await,
                "0" => break,
                _ => {
                    self.write("Unknown option. Try again.\n").await?;
                    Ok(())
                }
            };

            if let Err(e) = outcome {
                error!(error = %e, "Console operation failed");
                self.write(&format!("Operation failed: {e:#}\n")).await?;
            }
        }
        self.write("Shutting down...\n").await?;
        info!("Console session stopped");
        Ok(())
    }

    async fn create_user(&mut self) -> anyhow::Result<()> {
        let name = self.prompt("Name: ").await?;
        let email = self.prompt("Email: ").await?;
        let age = parse_age(&self.prompt("Age: ").await?)?;

        let user = self
            .api
            .create_user(NewUser {
                name,
                email,
                age: Some(age),
            })
            .await?;
        self.write(&format!("Created: {}\n", describe(&user))).await?;
        Ok(())
    }

    async fn list_users(&mut self) -> anyhow::Result<()> {
        let users = self.api.list_users().await?;
        if users.is_empty() {
            self.write("No users found.\n").await?;
        }
        for user in &users {
            self.write(&format!("{}\n", describe(user))).await?;
        }
        Ok(())
    }

    async fn get_user(&mut self) -> anyhow::Result<()> {
        let id = parse_id(&self.prompt("Id: ").await?)?;
        match self.api.get_user(id).await? {
            Some(user) => self.write(&format!("{}\n", describe(&user))).await?,
            None => self.write("User not found\n").await?,
        }
        Ok(())
    }

    async fn update_user(&mut self) -> anyhow::Result<()> {
        let id = parse_id(&self.prompt("Id: ").await?)?;
        let Some(current) = self.api.get_user(id).await? else {
            self.write("User not found\n").await?;
            return Ok(());
        };
        self.write(&format!("Current: {}\n", describe(&current)))
            .await?;

        let name = self.prompt("New name (blank to keep): ").await?;
        let email = self.prompt("New email (blank to keep): ").await?;
        let age = self.prompt("New age (blank to keep): ").await?;
        let age = if age.is_empty() {
            None
        } else {
            Some(parse_age(&age)?)
        };

        let patch = UserPatch {
            name: Some(name).filter(|s| !s.is_empty()),
            email: Some(email).filter(|s| !s.is_empty()),
            age,
        };
        let user = self.api.update_user(id, patch).await?;
        self.write(&format!("Updated: {}\n", describe(&user))).await?;
        Ok(())
    }

    async fn delete_user(&mut self) -> anyhow::Result<()> {
        let id = parse_id(&self.prompt("Id: ").await?)?;
        if self.api.delete_user(id).await? {
            self.write("Deleted\n").await?;
        } else {
            self.write("User not found\n").await?;
        }
        Ok(())
    }

    async fn prompt(&mut self, label: &str) -> anyhow::Result<String> {
        self.write(label).await?;
        self.read_line()
            .await?
            .ok_or_else(|| anyhow!("unexpected end of input"))
    }

    /// Next trimmed line, or `None` at end of input.
    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }
}

fn parse_id(raw: &str) -> anyhow::Result<UserId> {
    raw.parse()
        .with_context(|| format!("invalid id '{raw}'"))
}

fn parse_age(raw: &str) -> anyhow::Result<i32> {
    if raw.is_empty() {
        bail!("age is required");
    }
    raw.parse()
        .with_context(|| format!("invalid age '{raw}'"))
}

fn describe(user: &User) -> String {
    format!(
        "User{{id={}, name='{}', email='{}', age={}, createdAt={}}}",
        user.id,
        user.name,
        user.email,
        user.age,
        user.created_at.to_rfc3339()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_helpers_reject_garbage() {
        assert_eq!(parse_id(" 7".trim()).unwrap(), 7);
        assert!(parse_id("seven").is_err());
        assert!(parse_age("").is_err());
        assert_eq!(parse_age("0").unwrap(), 0);
        let msg = format!("{:#}", parse_age("old").unwrap_err());
        assert!(msg.starts_with("invalid age 'old'"), "{msg}");
    }
}
