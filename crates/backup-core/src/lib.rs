pub mod backup;
pub mod config;
pub mod error;
pub mod exec;
pub mod installer;
pub mod launchd;
pub mod lockfile;
pub mod logs;
pub mod paths;
pub mod rclone;
pub mod rclone_conf;
pub mod scripts;
pub mod sync_pairs;
