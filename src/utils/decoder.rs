//! Call-data decoder module
//! Selector table + typed ABI decoding for every function the classifier knows

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolInterface};

use crate::models::types::{
    SecurityRiskLevel, TransactionComplexity, TransactionDetails, TransactionIntent,
    TransactionType,
};
use crate::utils::constants::{format_native, practical_unlimited_threshold};

/// ERC-20 token functions
pub mod erc20 {
    alloy_sol_types::sol! {
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// ERC-721 functions
pub mod erc721 {
    alloy_sol_types::sol! {
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
        function setApprovalForAll(address operator, bool approved) external;
    }
}

/// ERC-721 `safeTransferFrom` overload carrying receiver data
pub mod erc721_data {
    alloy_sol_types::sol! {
        function safeTransferFrom(address from, address to, uint256 tokenId, bytes data) external;
    }
}

/// ERC-1155 single transfer
pub mod erc1155 {
    alloy_sol_types::sol! {
        function safeTransferFrom(address from, address to, uint256 id, uint256 amount, bytes data) external;
    }
}

/// Uniswap V2 style router (swaps + liquidity)
pub mod v2_router {
    alloy_sol_types::sol! {
        interface IUniswapV2Router {
            function swapExactTokensForTokens(
                uint256 amountIn,
                uint256 amountOutMin,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external returns (uint256[] memory amounts);

            function swapTokensForExactTokens(
                uint256 amountOut,
                uint256 amountInMax,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external returns (uint256[] memory amounts);

            function swapExactETHForTokens(
                uint256 amountOutMin,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external payable returns (uint256[] memory amounts);

            function swapTokensForExactETH(
                uint256 amountOut,
                uint256 amountInMax,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external returns (uint256[] memory amounts);

            function swapExactTokensForETH(
                uint256 amountIn,
                uint256 amountOutMin,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external returns (uint256[] memory amounts);

            function swapETHForExactTokens(
                uint256 amountOut,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external payable returns (uint256[] memory amounts);

            function swapExactTokensForTokensSupportingFeeOnTransferTokens(
                uint256 amountIn,
                uint256 amountOutMin,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external;

            function swapExactETHForTokensSupportingFeeOnTransferTokens(
                uint256 amountOutMin,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external payable;

            function swapExactTokensForETHSupportingFeeOnTransferTokens(
                uint256 amountIn,
                uint256 amountOutMin,
                address[] calldata path,
                address to,
                uint256 deadline
            ) external;

            function addLiquidity(
                address tokenA,
                address tokenB,
                uint256 amountADesired,
                uint256 amountBDesired,
                uint256 amountAMin,
                uint256 amountBMin,
                address to,
                uint256 deadline
            ) external returns (uint256 amountA, uint256 amountB, uint256 liquidity);

            function addLiquidityETH(
                address token,
                uint256 amountTokenDesired,
                uint256 amountTokenMin,
                uint256 amountETHMin,
                address to,
                uint256 deadline
            ) external payable returns (uint256 amountToken, uint256 amountETH, uint256 liquidity);

            function removeLiquidity(
                address tokenA,
                address tokenB,
                uint256 liquidity,
                uint256 amountAMin,
                uint256 amountBMin,
                address to,
                uint256 deadline
            ) external returns (uint256 amountA, uint256 amountB);

            function removeLiquidityETH(
                address token,
                uint256 liquidity,
                uint256 amountTokenMin,
                uint256 amountETHMin,
                address to,
                uint256 deadline
            ) external returns (uint256 amountToken, uint256 amountETH);
        }
    }

    pub use IUniswapV2Router::*;
}

/// Uniswap V3 SwapRouter
pub mod v3_router {
    alloy_sol_types::sol! {
        interface ISwapRouter {
            struct ExactInputSingleParams {
                address tokenIn;
                address tokenOut;
                uint24 fee;
                address recipient;
                uint256 deadline;
                uint256 amountIn;
                uint256 amountOutMinimum;
                uint160 sqrtPriceLimitX96;
            }

            struct ExactInputParams {
                bytes path;
                address recipient;
                uint256 deadline;
                uint256 amountIn;
                uint256 amountOutMinimum;
            }

            struct ExactOutputSingleParams {
                address tokenIn;
                address tokenOut;
                uint24 fee;
                address recipient;
                uint256 deadline;
                uint256 amountOut;
                uint256 amountInMaximum;
                uint160 sqrtPriceLimitX96;
            }

            struct ExactOutputParams {
                bytes path;
                address recipient;
                uint256 deadline;
                uint256 amountOut;
                uint256 amountInMaximum;
            }

            function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
            function exactInput(ExactInputParams calldata params) external payable returns (uint256 amountOut);
            function exactOutputSingle(ExactOutputSingleParams calldata params) external payable returns (uint256 amountIn);
            function exactOutput(ExactOutputParams calldata params) external payable returns (uint256 amountIn);
        }
    }

    pub use ISwapRouter::*;
}

/// Aave style lending pool
pub mod lending {
    alloy_sol_types::sol! {
        interface ILendingPool {
            function deposit(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
            function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
            function withdraw(address asset, uint256 amount, address to) external returns (uint256);
            function borrow(address asset, uint256 amount, uint256 interestRateMode, uint16 referralCode, address onBehalfOf) external;
            function repay(address asset, uint256 amount, uint256 rateMode, address onBehalfOf) external returns (uint256);
        }
    }

    pub use ILendingPool::*;
}

pub type DecodeResult = Result<TransactionDetails, alloy_sol_types::Error>;

/// One row of the static selector table
pub struct KnownSelector {
    pub selector: [u8; 4],
    /// Human readable function name
    pub name: &'static str,
    pub label: &'static str,
    pub tx_type: TransactionType,
    pub complexity: TransactionComplexity,
    pub base_risk: SecurityRiskLevel,
    /// Risk used when the parameters cannot be decoded
    pub fallback_risk: SecurityRiskLevel,
    decode: fn(&TransactionIntent) -> DecodeResult,
}

impl KnownSelector {
    pub fn decode(&self, intent: &TransactionIntent) -> DecodeResult {
        (self.decode)(intent)
    }
}

macro_rules! known {
    ($call:ty, $name:literal, $label:literal, $ty:ident, $cx:ident, $risk:ident, $fallback:ident, $decode:path) => {
        KnownSelector {
            selector: <$call as SolCall>::SELECTOR,
            name: $name,
            label: $label,
            tx_type: TransactionType::$ty,
            complexity: TransactionComplexity::$cx,
            base_risk: SecurityRiskLevel::$risk,
            fallback_risk: SecurityRiskLevel::$fallback,
            decode: $decode,
        }
    };
}

/// Static selector table
pub static KNOWN_SELECTORS: &[KnownSelector] = &[
    // ERC-20
    known!(erc20::transferCall, "transfer", "ERC-20 token transfer", Transfer, Simple, Low, Medium, decode_transfer),
    known!(erc20::transferFromCall, "transferFrom", "ERC-20 delegated transfer", Transfer, Simple, Medium, Medium, decode_transfer_from),
    known!(erc20::approveCall, "approve", "ERC-20 token approval", Approval, Simple, Medium, Medium, decode_approve_details),
    // Uniswap V2 style
    known!(v2_router::swapExactTokensForTokensCall, "swapExactTokensForTokens", "Token swap (exact input)", SwapExactTokensForTokens, Medium, Medium, Medium, decode_v2_swap),
    known!(v2_router::swapTokensForExactTokensCall, "swapTokensForExactTokens", "Token swap (exact output)", SwapTokensForExactTokens, Medium, Medium, Medium, decode_v2_swap),
    known!(v2_router::swapExactETHForTokensCall, "swapExactETHForTokens", "Native-to-token swap (exact input)", SwapExactEthForTokens, Medium, Medium, Medium, decode_v2_swap),
    known!(v2_router::swapTokensForExactETHCall, "swapTokensForExactETH", "Token-to-native swap (exact output)", SwapTokensForExactEth, Medium, Medium, Medium, decode_v2_swap),
    known!(v2_router::swapExactTokensForETHCall, "swapExactTokensForETH", "Token-to-native swap (exact input)", SwapExactTokensForEth, Medium, Medium, Medium, decode_v2_swap),
    known!(v2_router::swapETHForExactTokensCall, "swapETHForExactTokens", "Native-to-token swap (exact output)", SwapEthForExactTokens, Medium, Medium, Medium, decode_v2_swap),
    known!(v2_router::swapExactTokensForTokensSupportingFeeOnTransferTokensCall, "swapExactTokensForTokensSupportingFeeOnTransferTokens", "Fee-on-transfer token swap", SwapExactTokensForTokens, Medium, Medium, Medium, decode_v2_swap),
    known!(v2_router::swapExactETHForTokensSupportingFeeOnTransferTokensCall, "swapExactETHForTokensSupportingFeeOnTransferTokens", "Fee-on-transfer native-to-token swap", SwapExactEthForTokens, Medium, Medium, Medium, decode_v2_swap),
    known!(v2_router::swapExactTokensForETHSupportingFeeOnTransferTokensCall, "swapExactTokensForETHSupportingFeeOnTransferTokens", "Fee-on-transfer token-to-native swap", SwapExactTokensForEth, Medium, Medium, Medium, decode_v2_swap),
    // Uniswap V3
    known!(v3_router::exactInputSingleCall, "exactInputSingle", "Single-pool swap (exact input)", SwapExactTokensForTokens, Medium, Medium, Medium, decode_v3_swap),
    known!(v3_router::exactInputCall, "exactInput", "Multi-hop swap (exact input)", SwapExactTokensForTokens, Complex, Medium, Medium, decode_v3_swap),
    known!(v3_router::exactOutputSingleCall, "exactOutputSingle", "Single-pool swap (exact output)", SwapTokensForExactTokens, Medium, Medium, Medium, decode_v3_swap),
    known!(v3_router::exactOutputCall, "exactOutput", "Multi-hop swap (exact output)", SwapTokensForExactTokens, Complex, Medium, Medium, decode_v3_swap),
    // NFTs
    known!(erc721::safeTransferFromCall, "safeTransferFrom", "ERC-721 NFT transfer", NftTransfer, Simple, Low, Medium, decode_nft_transfer),
    known!(erc721_data::safeTransferFromCall, "safeTransferFrom", "ERC-721 NFT transfer with data", NftTransfer, Simple, Low, Medium, decode_nft_transfer),
    known!(erc1155::safeTransferFromCall, "safeTransferFrom", "ERC-1155 token transfer", NftTransfer, Medium, Low, Medium, decode_nft_transfer),
    known!(erc721::setApprovalForAllCall, "setApprovalForAll", "Collection-wide NFT approval", NftApproval, Simple, High, High, decode_nft_approval),
    // Liquidity
    known!(v2_router::addLiquidityCall, "addLiquidity", "Add liquidity", AddLiquidity, Complex, Medium, Medium, decode_liquidity),
    known!(v2_router::addLiquidityETHCall, "addLiquidityETH", "Add liquidity with native currency", AddLiquidity, Complex, Medium, Medium, decode_liquidity),
    known!(v2_router::removeLiquidityCall, "removeLiquidity", "Remove liquidity", RemoveLiquidity, Complex, Medium, Medium, decode_liquidity),
    known!(v2_router::removeLiquidityETHCall, "removeLiquidityETH", "Remove liquidity to native currency", RemoveLiquidity, Complex, Medium, Medium, decode_liquidity),
    // Lending
    known!(lending::depositCall, "deposit", "Lending deposit", Lending, Medium, Low, Medium, decode_lending),
    known!(lending::supplyCall, "supply", "Lending supply", Lending, Medium, Low, Medium, decode_lending),
    known!(lending::withdrawCall, "withdraw", "Lending withdrawal", Lending, Medium, Medium, Medium, decode_lending),
    known!(lending::repayCall, "repay", "Loan repayment", Lending, Medium, Low, Medium, decode_lending),
    known!(lending::borrowCall, "borrow", "Borrow against collateral", Borrowing, Complex, High, High, decode_lending),
];

/// Look up a selector in the static table
pub fn lookup_selector(selector: [u8; 4]) -> Option<&'static KnownSelector> {
    KNOWN_SELECTORS.iter().find(|k| k.selector == selector)
}

/// Exactly the max uint256, or at least 10^9 whole tokens at 18 decimals
#[inline]
pub fn is_unlimited_amount(amount: U256) -> bool {
    amount == U256::MAX || amount >= practical_unlimited_threshold()
}

/// `0x`-prefixed lowercase selector
pub fn selector_hex(selector: [u8; 4]) -> String {
    format!("0x{}", hex::encode(selector))
}

/// Build `approve(spender, amount)` call data
pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
    Bytes::from(erc20::approveCall { spender, amount }.abi_encode())
}

/// Decode `approve` parameters as (spender, amount)
pub fn decode_approve(data: &[u8]) -> Result<(Address, U256), alloy_sol_types::Error> {
    let call = erc20::approveCall::abi_decode(data, false)?;
    Ok((call.spender, call.amount))
}

#[inline]
fn target(intent: &TransactionIntent) -> Address {
    intent.to.unwrap_or_default()
}

fn eth_value(intent: &TransactionIntent) -> Option<String> {
    (!intent.value.is_zero()).then(|| format_native(intent.value))
}

fn decode_transfer(intent: &TransactionIntent) -> DecodeResult {
    let call = erc20::transferCall::abi_decode(&intent.data, false)?;
    Ok(TransactionDetails::TokenTransfer {
        token_address: target(intent),
        sender: None,
        recipient: call.to,
        amount: call.amount,
    })
}

fn decode_transfer_from(intent: &TransactionIntent) -> DecodeResult {
    let call = erc20::transferFromCall::abi_decode(&intent.data, false)?;
    Ok(TransactionDetails::TokenTransfer {
        token_address: target(intent),
        sender: Some(call.from),
        recipient: call.to,
        amount: call.amount,
    })
}

fn decode_approve_details(intent: &TransactionIntent) -> DecodeResult {
    let (spender, amount) = decode_approve(&intent.data)?;
    Ok(TransactionDetails::Approval {
        token_address: target(intent),
        spender_address: spender,
        amount,
        is_unlimited: is_unlimited_amount(amount),
    })
}

fn decode_v2_swap(intent: &TransactionIntent) -> DecodeResult {
    use v2_router::IUniswapV2RouterCalls as Calls;

    let swap = |amount_in, amount_in_max, amount_out, amount_out_min, path, to| {
        TransactionDetails::Swap {
            amount_in,
            amount_in_max,
            amount_out,
            amount_out_min,
            path,
            recipient: Some(to),
            eth_value: eth_value(intent),
        }
    };
    let value = Some(intent.value);

    let details = match Calls::abi_decode(&intent.data, false)? {
        Calls::swapExactTokensForTokens(c) => {
            swap(Some(c.amountIn), None, None, Some(c.amountOutMin), c.path, c.to)
        }
        Calls::swapTokensForExactTokens(c) => {
            swap(None, Some(c.amountInMax), Some(c.amountOut), None, c.path, c.to)
        }
        Calls::swapExactETHForTokens(c) => {
            swap(value, None, None, Some(c.amountOutMin), c.path, c.to)
        }
        Calls::swapTokensForExactETH(c) => {
            swap(None, Some(c.amountInMax), Some(c.amountOut), None, c.path, c.to)
        }
        Calls::swapExactTokensForETH(c) => {
            swap(Some(c.amountIn), None, None, Some(c.amountOutMin), c.path, c.to)
        }
        Calls::swapETHForExactTokens(c) => {
            swap(None, value, Some(c.amountOut), None, c.path, c.to)
        }
        Calls::swapExactTokensForTokensSupportingFeeOnTransferTokens(c) => {
            swap(Some(c.amountIn), None, None, Some(c.amountOutMin), c.path, c.to)
        }
        Calls::swapExactETHForTokensSupportingFeeOnTransferTokens(c) => {
            swap(value, None, None, Some(c.amountOutMin), c.path, c.to)
        }
        Calls::swapExactTokensForETHSupportingFeeOnTransferTokens(c) => {
            swap(Some(c.amountIn), None, None, Some(c.amountOutMin), c.path, c.to)
        }
        _ => {
            return Err(alloy_sol_types::Error::custom(
                "selector is not a V2 swap",
            ))
        }
    };
    Ok(details)
}

/// Token addresses of a packed V3 path (`token | fee(3) | token | ...`)
pub fn v3_path_tokens(path: &[u8]) -> Vec<Address> {
    path.chunks(23)
        .filter(|chunk| chunk.len() >= 20)
        .map(|chunk| Address::from_slice(&chunk[..20]))
        .collect()
}

fn decode_v3_swap(intent: &TransactionIntent) -> DecodeResult {
    use v3_router::ISwapRouterCalls as Calls;

    let eth_value = eth_value(intent);
    let details = match Calls::abi_decode(&intent.data, false)? {
        Calls::exactInputSingle(c) => TransactionDetails::Swap {
            amount_in: Some(c.params.amountIn),
            amount_in_max: None,
            amount_out: None,
            amount_out_min: Some(c.params.amountOutMinimum),
            path: vec![c.params.tokenIn, c.params.tokenOut],
            recipient: Some(c.params.recipient),
            eth_value,
        },
        Calls::exactInput(c) => TransactionDetails::Swap {
            amount_in: Some(c.params.amountIn),
            amount_in_max: None,
            amount_out: None,
            amount_out_min: Some(c.params.amountOutMinimum),
            path: v3_path_tokens(&c.params.path),
            recipient: Some(c.params.recipient),
            eth_value,
        },
        Calls::exactOutputSingle(c) => TransactionDetails::Swap {
            amount_in: None,
            amount_in_max: Some(c.params.amountInMaximum),
            amount_out: Some(c.params.amountOut),
            amount_out_min: None,
            path: vec![c.params.tokenIn, c.params.tokenOut],
            recipient: Some(c.params.recipient),
            eth_value,
        },
        Calls::exactOutput(c) => {
            // exact-output paths are encoded output-first
            let mut path = v3_path_tokens(&c.params.path);
            path.reverse();
            TransactionDetails::Swap {
                amount_in: None,
                amount_in_max: Some(c.params.amountInMaximum),
                amount_out: Some(c.params.amountOut),
                amount_out_min: None,
                path,
                recipient: Some(c.params.recipient),
                eth_value,
            }
        }
    };
    Ok(details)
}

fn decode_nft_transfer(intent: &TransactionIntent) -> DecodeResult {
    let collection = target(intent);
    let selector = intent.selector().unwrap_or_default();

    if selector == erc1155::safeTransferFromCall::SELECTOR {
        let c = erc1155::safeTransferFromCall::abi_decode(&intent.data, false)?;
        return Ok(TransactionDetails::NftTransfer {
            collection,
            sender: c.from,
            recipient: c.to,
            token_id: c.id,
            amount: Some(c.amount),
        });
    }
    if selector == erc721_data::safeTransferFromCall::SELECTOR {
        let c = erc721_data::safeTransferFromCall::abi_decode(&intent.data, false)?;
        return Ok(TransactionDetails::NftTransfer {
            collection,
            sender: c.from,
            recipient: c.to,
            token_id: c.tokenId,
            amount: None,
        });
    }
    let c = erc721::safeTransferFromCall::abi_decode(&intent.data, false)?;
    Ok(TransactionDetails::NftTransfer {
        collection,
        sender: c.from,
        recipient: c.to,
        token_id: c.tokenId,
        amount: None,
    })
}

fn decode_nft_approval(intent: &TransactionIntent) -> DecodeResult {
    let c = erc721::setApprovalForAllCall::abi_decode(&intent.data, false)?;
    Ok(TransactionDetails::NftApproval {
        collection: target(intent),
        operator: c.operator,
        approved: c.approved,
    })
}

fn decode_liquidity(intent: &TransactionIntent) -> DecodeResult {
    use v2_router::IUniswapV2RouterCalls as Calls;

    let details = match Calls::abi_decode(&intent.data, false)? {
        Calls::addLiquidity(c) => TransactionDetails::Liquidity {
            token_a: c.tokenA,
            token_b: Some(c.tokenB),
            liquidity: None,
            recipient: c.to,
        },
        Calls::addLiquidityETH(c) => TransactionDetails::Liquidity {
            token_a: c.token,
            token_b: None,
            liquidity: None,
            recipient: c.to,
        },
        Calls::removeLiquidity(c) => TransactionDetails::Liquidity {
            token_a: c.tokenA,
            token_b: Some(c.tokenB),
            liquidity: Some(c.liquidity),
            recipient: c.to,
        },
        Calls::removeLiquidityETH(c) => TransactionDetails::Liquidity {
            token_a: c.token,
            token_b: None,
            liquidity: Some(c.liquidity),
            recipient: c.to,
        },
        _ => {
            return Err(alloy_sol_types::Error::custom(
                "selector is not a liquidity call",
            ))
        }
    };
    Ok(details)
}

fn decode_lending(intent: &TransactionIntent) -> DecodeResult {
    use lending::ILendingPoolCalls as Calls;

    let (asset, amount, on_behalf_of) = match Calls::abi_decode(&intent.data, false)? {
        Calls::deposit(c) => (c.asset, c.amount, c.onBehalfOf),
        Calls::supply(c) => (c.asset, c.amount, c.onBehalfOf),
        Calls::withdraw(c) => (c.asset, c.amount, c.to),
        Calls::borrow(c) => (c.asset, c.amount, c.onBehalfOf),
        Calls::repay(c) => (c.asset, c.amount, c.onBehalfOf),
    };
    Ok(TransactionDetails::Lending {
        asset,
        amount,
        on_behalf_of,
    })
}
