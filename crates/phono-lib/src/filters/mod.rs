pub mod bandpass;
pub mod savgol;
