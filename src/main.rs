// Prevents additional console window on Windows in release.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    if let Err(error) = ya_desktop_lib::run() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
