mod opt;
mod routes;
mod utils;

use clap::Parser;
use opt::Opt;

fn route_cmd(opt: Opt) -> i32 {
    match opt {
        Opt::Simulate(cmd) => routes::simulate(cmd),
        Opt::Posterior(cmd) => routes::posterior(cmd),
    }
}

fn main() {
    env_logger::init();

    let opt = Opt::parse();

    let exit_code = route_cmd(opt);

    std::process::exit(exit_code);
}
