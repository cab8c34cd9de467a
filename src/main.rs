pub mod cli;

fn main() -> anyhow::Result<()> {
    preg_shape::init_tracing();
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
