mod command;
mod util;

#[cfg(test)]
mod testing;

fn main() -> anyhow::Result<()> {
    command::run()
}
