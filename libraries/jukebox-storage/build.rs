// `sqlx::migrate!` embeds the SQL files at compile time; a new or edited
// migration has to force a rebuild of the crate.
fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
