//! Type-safe bindings to the ERC-20 functions used for token transfers.

use ethers::contract::abigen;

// Generates `Erc20<M>` with `decimals`, `symbol`, `balance_of` and `transfer`.
abigen!(
    Erc20,
    r#"[
        function decimals() external view returns (uint8)
        function symbol() external view returns (string)
        function balanceOf(address owner) external view returns (uint256)
        function transfer(address to, uint256 amount) external returns (bool)
    ]"#;
);
