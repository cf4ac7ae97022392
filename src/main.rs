#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    dice_duel::rocket_initialize().launch().await?;
    Ok(())
}
