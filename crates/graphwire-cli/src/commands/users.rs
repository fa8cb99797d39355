use graphwire::Connection;

pub async fn list(connection: &Connection) -> anyhow::Result<()> {
    for user in connection.users().all().await? {
        match user.password_expiry_seconds() {
            Some(seconds) => println!("{}\tpassword expires in {seconds}s", user.username()),
            None => println!("{}", user.username()),
        }
    }
    Ok(())
}

pub async fn create(connection: &Connection, username: &str, password: &str) -> anyhow::Result<()> {
    connection.users().create(username, password).await?;
    println!("✓ Created user {username}");
    Ok(())
}

pub async fn delete(connection: &Connection, username: &str) -> anyhow::Result<()> {
    connection.users().delete(username).await?;
    println!("✓ Deleted user {username}");
    Ok(())
}
