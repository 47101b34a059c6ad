// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::Parser;
use log::info;

fn main() {
    // Run embers, only to capture any errors. It's important to capture the
    // errors so that they can be reported to the user without the noise of a
    // panic.
    if let Err(e) = embers::Embers::parse().run() {
        eprintln!("Error: {e}");
        info!("embers failed.");
        std::process::exit(1);
    }
}
