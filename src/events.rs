use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;

sol! {
    event LaunchCreated(
        address indexed token,
        address indexed curve,
        address indexed creator,
        bytes32 intentId,
        uint256 supplyCap,
        uint256 basePrice,
        uint256 priceIncrement,
        uint8 mode,
        bytes modeMetadata
    );

    event TokensPurchased(
        address indexed buyer,
        bytes32 indexed intentId,
        uint256 btcAmountSats,
        uint256 tokenAmountBaseUnits,
        uint256 newTotalSupply,
        uint256 newPrice
    );

    function name() external view returns (string);
    function symbol() external view returns (string);
    function creatorFeeBps() external view returns (uint256);
}

pub fn decode_launch_created(log: &Log) -> anyhow::Result<LaunchCreated> {
    let log_data = log.data();
    let decoded = LaunchCreated::decode_raw_log(log.topics(), &log_data.data)?;
    Ok(decoded)
}

pub fn decode_tokens_purchased(log: &Log) -> anyhow::Result<TokensPurchased> {
    let log_data = log.data();
    let decoded = TokensPurchased::decode_raw_log(log.topics(), &log_data.data)?;
    Ok(decoded)
}
