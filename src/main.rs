fn main() -> std::process::ExitCode {
    turbo_video_lib::run()
}
