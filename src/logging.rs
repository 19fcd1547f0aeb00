pub fn init() {
	env_logger::init();
}
