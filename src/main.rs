fn main() {
    chesscore::logging::init(None);
    chesscore::board::init();
    chesscore::uci::run();
}
