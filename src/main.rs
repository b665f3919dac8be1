mod app;
mod term;

pub type TermInt = u16;
pub type Coords = (TermInt, TermInt);

use anyhow::Result;

fn main() -> Result<()> {
    let mut app = app::App::new()?;
    app.run()
}
